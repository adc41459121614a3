//! Synthetic coordinates for tests and benchmarks

use ndarray::{Array, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;

/// Draw `blob_size` points around every row of `centres` (shape `(n_blobs, n_features)`), with
/// unit variance along each feature.
///
/// The result has shape `(n_blobs * blob_size, n_features)`; the points of blob `i` are rows
/// `i * blob_size .. (i + 1) * blob_size`.
pub fn generate_blobs(
    blob_size: usize,
    centres: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let (n_blobs, n_features) = centres.dim();
    let owners: Vec<usize> = (0..n_blobs * blob_size).map(|i| i / blob_size).collect();
    let noise: Array2<f64> =
        Array::random_using((n_blobs * blob_size, n_features), StandardNormal, rng);
    noise + centres.select(Axis(0), &owners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s};
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn blobs_are_laid_out_in_order() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let centres = array![[100., 0.], [-100., 0.]];
        let points = generate_blobs(50, &centres, &mut rng);
        assert_eq!(points.dim(), (100, 2));
        assert!(points.slice(s![..50, 0]).iter().all(|&x| x > 50.));
        assert!(points.slice(s![50.., 0]).iter().all(|&x| x < -50.));
    }
}
