use crate::gaussian_mixture::errors::{GmmError, Result};
use crate::gaussian_mixture::hyperparams::{GmmInit, GmmParams, GmmValidParams};
use crate::k_means::{KMeans, KMeansError};
use crate::param_guard::ParamGuard;
use crate::traits::{Fit, Predict};
use crate::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{s, Array, Array1, Array2, Array3, ArrayBase, ArrayView1, Axis, Data, Ix2, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use serde::{Deserialize, Serialize};

/// A mixture of Gaussians with full covariance matrices, fitted by expectation-maximization.
///
/// Each run starts from responsibilities (the probability that component `k` produced
/// observation `i`) given by [`GmmInit`], then alternates:
///
/// 1. E step: recompute the responsibilities from the current weights, means and covariances;
/// 2. M step: refit weights, means and covariances from those responsibilities.
///
/// A run stops when the mean log-likelihood changes by less than `tolerance`, or after
/// `max_n_iterations` (logged as a warning, the last model is kept). With several `n_runs`
/// the run with the highest log-likelihood wins.
///
/// A component that ends up with no responsibility mass is kept: its mass is padded by a few
/// machine epsilons, so it gets a negligible weight and never wins a prediction.
///
/// ```
/// use beatmix::gaussian_mixture::GaussianMixtureModel;
/// use beatmix::generate::generate_blobs;
/// use beatmix::traits::{Fit, Predict};
/// use ndarray::{array, Axis};
/// use rand::SeedableRng;
/// use rand_isaac::Isaac64Rng;
///
/// let mut rng = Isaac64Rng::seed_from_u64(42);
/// let centres = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// let observations = generate_blobs(200, &centres, &mut rng);
///
/// let gmm = GaussianMixtureModel::params(centres.nrows())
///     .n_runs(3)
///     .tolerance(1e-4)
///     .with_rng(rng)
///     .fit(&observations)
///     .expect("GMM fitting");
///
/// let component = gmm.predict(&array![[-9., 20.5]])[0];
/// let mean = gmm.means().index_axis(Axis(0), component);
/// assert!((mean[0] + 10.).abs() < 1.);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianMixtureModel<F: Float> {
    weights: Array1<F>,
    means: Array2<F>,
    covariances: Array3<F>,
    precisions: Array3<F>,
    /// Upper-triangular `L^-T` per component, where `L L^T` is the covariance
    precisions_chol: Array3<F>,
}

impl<F: Float> GaussianMixtureModel<F> {
    pub fn params(n_clusters: usize) -> GmmParams<F, Isaac64Rng> {
        GmmParams::new(n_clusters)
    }

    pub fn params_with_rng<R: Rng + Clone>(n_clusters: usize, rng: R) -> GmmParams<F, R> {
        GmmParams::new_with_rng(n_clusters, rng)
    }

    pub fn n_clusters(&self) -> usize {
        self.means.nrows()
    }

    /// Mixing weights, shape `(n_clusters,)`, summing to 1
    pub fn weights(&self) -> &Array1<F> {
        &self.weights
    }

    /// Shape `(n_clusters, n_features)`
    pub fn means(&self) -> &Array2<F> {
        &self.means
    }

    /// Shape `(n_clusters, n_features, n_features)`
    pub fn covariances(&self) -> &Array3<F> {
        &self.covariances
    }

    /// Inverses of [`covariances`](Self::covariances)
    pub fn precisions(&self) -> &Array3<F> {
        &self.precisions
    }

    pub fn centroids(&self) -> &Array2<F> {
        &self.means
    }

    /// Posterior probability of every component for every observation, shape
    /// `(n_observations, n_clusters)`. Rows sum to 1.
    pub fn predict_probabilities<D: Data<Elem = F>>(
        &self,
        observations: &ArrayBase<D, Ix2>,
    ) -> Array2<F> {
        self.log_responsibilities(observations).1.mapv(F::exp)
    }

    /// M step: weights, means and covariances that best explain `observations` under the
    /// responsibilities `resp` (shape `(n_observations, n_clusters)`).
    fn from_responsibilities<D: Data<Elem = F>>(
        observations: &ArrayBase<D, Ix2>,
        resp: &Array2<F>,
        reg_covariance: F,
    ) -> Result<Self> {
        let (n_samples, n_features) = observations.dim();
        let n_clusters = resp.ncols();
        // padded so that a component nobody belongs to divides by a tiny mass instead of zero
        let mass = resp.sum_axis(Axis(0)) + F::cast(10.) * F::epsilon();

        let means = resp.t().dot(observations) / &mass.view().insert_axis(Axis(1));

        let mut covariances = Array3::zeros((n_clusters, n_features, n_features));
        let mut precisions_chol = Array3::zeros((n_clusters, n_features, n_features));
        let mut precisions = Array3::zeros((n_clusters, n_features, n_features));
        for k in 0..n_clusters {
            let centred = observations - &means.row(k);
            let weighted = &centred * &resp.column(k).insert_axis(Axis(1));
            let mut covariance = weighted.t().dot(&centred) / mass[k];
            covariance
                .diag_mut()
                .mapv_inplace(|v| v + reg_covariance);

            let lower = covariance.cholesky()?;
            let inv_lower = lower.solve_triangular_into(Array::eye(n_features), UPLO::Lower)?;
            let prec_chol = inv_lower.reversed_axes();
            precisions
                .slice_mut(s![k, .., ..])
                .assign(&prec_chol.dot(&prec_chol.t()));
            precisions_chol.slice_mut(s![k, .., ..]).assign(&prec_chol);
            covariances.slice_mut(s![k, .., ..]).assign(&covariance);
        }

        Ok(GaussianMixtureModel {
            weights: mass / F::cast(n_samples),
            means,
            covariances,
            precisions,
            precisions_chol,
        })
    }

    /// `ln(weight_k) + ln N(x_i | mean_k, covariance_k)`, shape `(n_observations, n_clusters)`
    fn weighted_log_densities<D: Data<Elem = F>>(
        &self,
        observations: &ArrayBase<D, Ix2>,
    ) -> Array2<F> {
        let (n_samples, n_features) = observations.dim();
        let half_log_2pi =
            F::cast(0.5 * n_features as f64 * (2. * std::f64::consts::PI).ln());
        let mut out = Array2::zeros((n_samples, self.n_clusters()));
        Zip::from(out.columns_mut())
            .and(self.means.rows())
            .and(self.precisions_chol.outer_iter())
            .and(&self.weights)
            .for_each(|mut column, mean, prec_chol, &weight| {
                // ln det(precision) / 2
                let half_log_det = prec_chol.diag().mapv(F::ln).sum();
                let whitened = (observations - &mean).dot(&prec_chol);
                let offset = weight.ln() + half_log_det - half_log_2pi;
                Zip::from(&mut column)
                    .and(whitened.rows())
                    .for_each(|v, row| *v = offset - F::cast(0.5) * row.dot(&row));
            });
        out
    }

    /// E step: per-observation log-likelihood, shape `(n_observations,)`, and log
    /// responsibilities, shape `(n_observations, n_clusters)`.
    fn log_responsibilities<D: Data<Elem = F>>(
        &self,
        observations: &ArrayBase<D, Ix2>,
    ) -> (Array1<F>, Array2<F>) {
        let mut log_resp = self.weighted_log_densities(observations);
        let log_likelihood = log_resp.map_axis(Axis(1), log_sum_exp);
        log_resp -= &log_likelihood.view().insert_axis(Axis(1));
        (log_likelihood, log_resp)
    }
}

/// Starting responsibilities for one run, shape `(n_observations, n_clusters)`
fn initial_responsibilities<F: Float, R: Rng + SeedableRng + Clone, D: Data<Elem = F>>(
    params: &GmmValidParams<F, R>,
    observations: &ArrayBase<D, Ix2>,
    rng: &mut R,
) -> Result<Array2<F>> {
    let n_samples = observations.nrows();
    let n_clusters = params.n_clusters();
    match params.init_method() {
        GmmInit::KMeans => {
            let kmeans = KMeans::params_with_rng(n_clusters, R::seed_from_u64(rng.gen::<u64>()))
                .n_runs(1)
                .check()
                .map_err(KMeansError::from)?
                .fit(observations)?;
            let mut resp = Array2::zeros((n_samples, n_clusters));
            for (row, &k) in kmeans.predict(observations).iter().enumerate() {
                resp[[row, k]] = F::one();
            }
            Ok(resp)
        }
        GmmInit::Random => {
            let draws =
                Array2::<f64>::random_using((n_samples, n_clusters), Uniform::new(0., 1.), rng);
            let totals = draws.sum_axis(Axis(1)).insert_axis(Axis(1));
            Ok((draws / totals).mapv(F::cast))
        }
    }
}

/// `ln(sum(exp(x)))`, shifted by the maximum so that very unlikely components do not underflow
fn log_sum_exp<F: Float>(row: ArrayView1<F>) -> F {
    let max = row.fold(F::neg_infinity(), |acc, &x| if x > acc { x } else { acc });
    if !max.is_finite() {
        return max;
    }
    max + row.mapv(|x| (x - max).exp()).sum().ln()
}

/// Index of the largest value, the first one on ties
fn argmax<F: Float>(row: ArrayView1<F>) -> usize {
    let mut best = 0;
    for (idx, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = idx;
        }
    }
    best
}

impl<F: Float, R: Rng + SeedableRng + Clone, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, GmmError>
    for GmmValidParams<F, R>
{
    type Object = GaussianMixtureModel<F>;

    fn fit(&self, observations: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let n_samples = observations.nrows();
        if n_samples < self.n_clusters() {
            return Err(GmmError::InvalidValue(format!(
                "{} observations cannot fill {} components",
                n_samples,
                self.n_clusters()
            )));
        }

        let mut rng = self.rng().clone();
        let mut best: Option<(F, GaussianMixtureModel<F>)> = None;

        for run in 0..self.n_runs() {
            let resp = initial_responsibilities(self, observations, &mut rng)?;
            let mut model = GaussianMixtureModel::from_responsibilities(
                observations,
                &resp,
                self.reg_covariance(),
            )?;

            let mut log_likelihood = F::neg_infinity();
            let mut converged_at = None;
            for n_iter in 0..self.max_n_iterations() {
                let (per_sample, log_resp) = model.log_responsibilities(observations);
                let mean = per_sample.sum() / F::cast(n_samples);
                model = GaussianMixtureModel::from_responsibilities(
                    observations,
                    &log_resp.mapv(F::exp),
                    self.reg_covariance(),
                )?;
                let change = mean - log_likelihood;
                log_likelihood = mean;
                if change.abs() < self.tolerance() {
                    converged_at = Some(n_iter);
                    break;
                }
            }

            match converged_at {
                Some(n_iter) => tracing::debug!(run, n_iter, "EM converged"),
                None => tracing::warn!(
                    run,
                    max_n_iterations = self.max_n_iterations(),
                    "EM stopped before converging, keeping the last model"
                ),
            }

            let improves = match &best {
                Some((best_ll, _)) => log_likelihood > *best_ll,
                None => !log_likelihood.is_nan(),
            };
            if improves {
                best = Some((log_likelihood, model));
            }
        }

        best.map(|(_, model)| model)
            .ok_or(GmmError::DegenerateLikelihood)
    }
}

impl<F: Float, D: Data<Elem = F>> Predict<&ArrayBase<D, Ix2>, Array1<usize>>
    for GaussianMixtureModel<F>
{
    /// Index of the component with the highest posterior probability for each observation
    fn predict(&self, observations: &ArrayBase<D, Ix2>) -> Array1<usize> {
        self.log_responsibilities(observations)
            .1
            .map_axis(Axis(1), argmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate_blobs;
    use approx::{abs_diff_eq, assert_abs_diff_eq};
    use ndarray::{array, concatenate, ArrayView2};
    use ndarray_rand::rand_distr::StandardNormal;

    /// `n` draws from `N(mean, covariance)`, coloured through the Cholesky factor
    fn correlated_normal(
        n: usize,
        mean: ArrayView1<f64>,
        covariance: ArrayView2<f64>,
        rng: &mut Isaac64Rng,
    ) -> Array2<f64> {
        let lower = covariance.cholesky().unwrap();
        let noise = Array2::<f64>::random_using((n, mean.len()), StandardNormal, rng);
        noise.dot(&lower.t()) + &mean
    }

    #[test]
    fn test_gmm_fit() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let means = array![[0., 0.], [5., 5.]];
        let covariances = array![[[1., 0.8], [0.8, 1.]], [[1., -0.6], [-0.6, 1.]]];
        let samples: Vec<_> = (0..2)
            .map(|k| {
                let covariance = covariances.index_axis(Axis(0), k);
                correlated_normal(500, means.row(k), covariance, &mut rng)
            })
            .collect();
        let observations = concatenate(Axis(0), &[samples[0].view(), samples[1].view()]).unwrap();

        let gmm = GaussianMixtureModel::params(2)
            .with_rng(rng)
            .fit(&observations)
            .expect("GMM fitting");

        let expected_weights = array![0.5, 0.5];
        assert_abs_diff_eq!(gmm.weights().view(), expected_weights.view(), epsilon = 1e-1);
        // component order depends on the k-means start
        let flipped = gmm.means().slice(s![..;-1, ..]);
        assert!(
            abs_diff_eq!(means, gmm.means().view(), epsilon = 2e-1)
                || abs_diff_eq!(means, flipped, epsilon = 2e-1)
        );
        let flipped = gmm.covariances().slice(s![..;-1, .., ..]);
        assert!(
            abs_diff_eq!(covariances, gmm.covariances().view(), epsilon = 2e-1)
                || abs_diff_eq!(covariances, flipped, epsilon = 2e-1)
        );
    }

    #[test]
    fn test_zeroed_reg_covar_const_failure() {
        // repeat values such that covariance is zero
        let xt = Array2::<f64>::ones((50, 1));
        let data = concatenate(Axis(1), &[xt.view(), xt.view()]).unwrap();

        // Test that cholesky decomposition fails when reg_covariance is zero
        let gmm = GaussianMixtureModel::params(1)
            .reg_covariance(0.)
            .fit(&data);
        assert!(matches!(
            gmm.expect_err("should generate an error with reg_covar being nul"),
            GmmError::Linalg(_)
        ));

        // Test it passes when default value is used
        assert!(GaussianMixtureModel::params(1).fit(&data).is_ok());
    }

    #[test]
    fn test_centroids_prediction() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
        let n = 1000;
        let blobs = generate_blobs(n, &expected_centroids, &mut rng);

        let n_clusters = expected_centroids.len_of(Axis(0));
        let gmm = GaussianMixtureModel::params(n_clusters)
            .with_rng(rng)
            .fit(&blobs)
            .expect("GMM fitting");

        let gmm_centroids = gmm.centroids();
        let memberships = gmm.predict(&expected_centroids);

        // check that centroids used to generate test dataset belongs to the right predicted cluster
        for (i, expected_c) in expected_centroids.outer_iter().enumerate() {
            let closest_c = gmm_centroids.index_axis(Axis(0), memberships[i]);
            Zip::from(&closest_c)
                .and(&expected_c)
                .for_each(|a, b| assert_abs_diff_eq!(a, b, epsilon = 1.))
        }
    }

    #[test]
    fn test_random_init() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let blobs = generate_blobs(100, &array![[0., 0.], [20., 20.]], &mut rng);
        let gmm = GaussianMixtureModel::params(2)
            .init_method(GmmInit::Random)
            .n_runs(3)
            .fit(&blobs)
            .expect("GMM fitting");
        assert_eq!(gmm.n_clusters(), 2);
        assert!(gmm.predict(&blobs).iter().all(|&m| m < 2));
        for row in gmm.predict_probabilities(&blobs).rows() {
            assert_abs_diff_eq!(row.sum(), 1., epsilon = 1e-8);
        }
        assert_abs_diff_eq!(gmm.weights().sum(), 1., epsilon = 1e-8);
    }

    #[test]
    fn test_duplicate_points_leave_a_component_empty() {
        // two distinct locations for three components
        let data: Array2<f64> = array![[1., 1.], [1., 1.], [2., 2.]];
        let gmm = GaussianMixtureModel::params(3)
            .fit(&data)
            .expect("an empty component is padded, not an error");
        let memberships = gmm.predict(&data);
        assert!(memberships.iter().all(|&m| m < 3));
        assert_eq!(memberships[0], memberships[1]);
        assert_ne!(memberships[0], memberships[2]);
        assert!(gmm.weights().iter().all(|w| w.is_finite()));
        assert!(gmm.means().iter().all(|m| m.is_finite()));
    }

    #[test]
    fn test_identical_points_fill_two_components() {
        let data = array![[1., 1.], [1., 1.]];
        let gmm = GaussianMixtureModel::params(2).fit(&data).unwrap();
        let memberships = gmm.predict(&data);
        assert_eq!(memberships[0], memberships[1]);
        assert_abs_diff_eq!(gmm.weights().sum(), 1., epsilon = 1e-8);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let mut rng = Isaac64Rng::seed_from_u64(3);
        let blobs = generate_blobs(60, &array![[0., 0.], [6., 6.], [-6., 6.]], &mut rng);
        let a = GaussianMixtureModel::params(3).fit(&blobs).unwrap();
        let b = GaussianMixtureModel::params(3).fit(&blobs).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&blobs), b.predict(&blobs));
    }

    #[test]
    fn test_far_apart_points_do_not_underflow() {
        let data = array![[1., 1.], [1.1, 1.1], [50., 50.]];
        let gmm = GaussianMixtureModel::params(2).fit(&data).unwrap();
        let memberships = gmm.predict(&data);
        assert_eq!(memberships[0], memberships[1]);
        assert_ne!(memberships[0], memberships[2]);

        let proba = gmm.predict_probabilities(&data);
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1., epsilon = 1e-8);
        }
    }

    #[test]
    fn test_model_serializes() {
        let data = array![[1., 1.], [1.1, 1.1], [50., 50.]];
        let gmm = GaussianMixtureModel::params(2).fit(&data).unwrap();
        let value = serde_json::to_value(&gmm).unwrap();
        for key in &["weights", "means", "covariances", "precisions"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_not_enough_samples() {
        let res = GaussianMixtureModel::params(3).fit(&array![[0., 0.], [1., 1.]]);
        assert!(matches!(res, Err(GmmError::InvalidValue(_))));
    }

    #[test]
    fn test_log_sum_exp() {
        assert_abs_diff_eq!(
            log_sum_exp(array![0f64.ln(), 1f64.ln(), 2f64.ln()].view()),
            3f64.ln(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(log_sum_exp(array![-1e4, -1e4].view()), -1e4 + 2f64.ln());
        assert_eq!(
            log_sum_exp(array![f64::NEG_INFINITY, f64::NEG_INFINITY].view()),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_invalid_params_are_reported_through_fit() {
        let res = GaussianMixtureModel::params(1).tolerance(0.).fit(&array![[0.]]);
        assert!(matches!(res, Err(GmmError::InvalidValue(_))));
    }
}
