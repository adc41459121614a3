use crate::k_means::errors::KMeansError;
use crate::k_means::hyperparams::{KMeansParams, KMeansValidParams};
use crate::traits::{Fit, Predict};
use crate::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, DataMut, Ix1, Ix2, Zip};
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// K-means clustering partitions a set of observations into clusters, where each observation
/// belongs to the cluster with the nearest mean (its *centroid*).
///
/// This is the modified Lloyd iteration known as m_k-means: in the update step the previous
/// centroid is counted as one more member of its cluster, so no cluster can end up empty.
///
/// Here K-means is used to initialize the [Gaussian mixture](crate::gaussian_mixture::GaussianMixtureModel):
/// the hard assignments it produces are the starting responsibilities of the EM algorithm.
///
/// Reaching `max_n_iterations` without the centroids settling is not an error; the centroids
/// reached so far are kept.
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<F>,
    inertia: F,
}

impl<F: Float> KMeans<F> {
    pub fn params(n_clusters: usize) -> KMeansParams<F, Isaac64Rng> {
        KMeansParams::new(n_clusters, Isaac64Rng::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_count(&self) -> &Array1<F> {
        &self.cluster_count
    }

    /// Return the sum of squared distances between each training point and its closest
    /// centroid, averaged across all training points.
    pub fn inertia(&self) -> F {
        self.inertia
    }
}

impl<F: Float, R: Rng + Clone, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    fn fit(&self, observations: &ArrayBase<D, Ix2>) -> Result<Self::Object, KMeansError> {
        let mut rng = self.rng().clone();
        let observations = observations.view();
        let n_samples = observations.nrows();
        let n_clusters = self.n_clusters();
        if n_samples < n_clusters {
            return Err(KMeansError::NotEnoughSamples {
                n_samples,
                n_clusters,
            });
        }

        let mut min_inertia = F::infinity();
        let mut best = None;
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);

        for run in 0..self.n_runs() {
            let mut centroids = self
                .init_method()
                .run(n_clusters, observations, &mut rng);
            let mut converged = false;
            for _ in 0..self.max_n_iterations() {
                update_memberships_and_dists(
                    &centroids,
                    &observations,
                    &mut memberships,
                    &mut dists,
                );
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                let shift = (&centroids - &new_centroids).mapv(|d| d * d).sum();
                centroids = new_centroids;
                if shift < self.tolerance() {
                    converged = true;
                    break;
                }
            }
            if !converged {
                tracing::debug!(run, "k-means stopped at max_n_iterations");
            }

            update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
            let inertia = dists.sum();
            // We keep the centroids which minimize the inertia over the n runs.
            if inertia < min_inertia {
                min_inertia = inertia;
                best = Some((centroids, memberships.clone()));
            }
        }

        match best {
            Some((centroids, memberships)) => {
                let mut cluster_count = Array1::zeros(n_clusters);
                memberships
                    .iter()
                    .for_each(|&c: &usize| cluster_count[c] += F::one());
                Ok(KMeans {
                    centroids,
                    cluster_count,
                    inertia: min_inertia / F::cast(n_samples),
                })
            }
            None => Err(KMeansError::InertiaError),
        }
    }
}

impl<F: Float, D: Data<Elem = F>> Predict<&ArrayBase<D, Ix2>, Array1<usize>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    fn predict(&self, observations: &ArrayBase<D, Ix2>) -> Array1<usize> {
        let mut memberships = Array1::zeros(observations.nrows());
        Zip::from(observations.rows())
            .and(&mut memberships)
            .for_each(|observation, membership| {
                *membership = closest_centroid(&self.centroids, &observation).0
            });
        memberships
    }
}

/// We compute new centroids using the previous centroids and the cluster memberships of each
/// observation. Each previous centroid counts as one more observation of its cluster, which
/// keeps clusters that lost all their members in place.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::ones(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });
    // m_k-means: Treat the old centroid like another point in the cluster
    centroids += old_centroids;

    Zip::from(centroids.rows_mut())
        .and(&counts)
        .for_each(|mut centroid, &cnt| centroid /= F::cast(cnt));
    centroids
}

// Efficient combination of assigning memberships and recording the squared distance to the
// assigned centroid.
fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .and(dists)
        .for_each(|observation, cluster_membership, dist| {
            let (m, d) = closest_centroid(centroids, &observation);
            *cluster_membership = m;
            *dist = d;
        });
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// along with the squared euclidean distance to it.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance: F = centroid
            .iter()
            .zip(observation.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum();
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}
