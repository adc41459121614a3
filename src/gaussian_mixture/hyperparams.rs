use crate::gaussian_mixture::errors::{GmmError, Result};
use crate::param_guard::ParamGuard;
use crate::Float;
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use serde::{Deserialize, Serialize};

/// Where the first responsibilities of an EM run come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GmmInit {
    /// One-hot memberships of a single k-means++ run
    KMeans,
    /// Uniform draws, normalized so every row sums to 1
    Random,
}

/// Checked mixture parameters, obtained from [`GmmParams`] through [`ParamGuard`].
///
/// Every component has its own full covariance matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct GmmValidParams<F: Float, R: Rng> {
    n_clusters: usize,
    tolerance: F,
    reg_covariance: F,
    n_runs: usize,
    max_n_iterations: u64,
    init: GmmInit,
    rng: R,
}

impl<F: Float, R: Rng + Clone> GmmValidParams<F, R> {
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn reg_covariance(&self) -> F {
        self.reg_covariance
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn init_method(&self) -> GmmInit {
        self.init
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// Unchecked mixture parameters.
///
/// | parameter | default |
/// |---|---|
/// | `tolerance` | `1e-3` |
/// | `reg_covariance` | `1e-6` |
/// | `n_runs` | `1` |
/// | `max_n_iterations` | `100` |
/// | `init_method` | [`GmmInit::KMeans`] |
#[derive(Clone, Debug, PartialEq)]
pub struct GmmParams<F: Float, R: Rng>(GmmValidParams<F, R>);

impl<F: Float> GmmParams<F, Isaac64Rng> {
    /// `n_clusters` components, drawing from an `Isaac64Rng` seeded with 42
    pub fn new(n_clusters: usize) -> Self {
        Self::new_with_rng(n_clusters, Isaac64Rng::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng + Clone> GmmParams<F, R> {
    pub fn new_with_rng(n_clusters: usize, rng: R) -> Self {
        Self(GmmValidParams {
            n_clusters,
            tolerance: F::cast(1e-3),
            reg_covariance: F::cast(1e-6),
            n_runs: 1,
            max_n_iterations: 100,
            init: GmmInit::KMeans,
            rng,
        })
    }

    /// EM stops once the mean log-likelihood moves by less than this between two iterations.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Added to the diagonal of every covariance matrix so that components sitting on identical
    /// points stay invertible.
    pub fn reg_covariance(mut self, reg_covariance: F) -> Self {
        self.0.reg_covariance = reg_covariance;
        self
    }

    /// Number of independent EM runs; the one with the best log-likelihood is kept.
    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn init_method(mut self, init: GmmInit) -> Self {
        self.0.init = init;
        self
    }

    /// Replace the random generator, keeping every other parameter.
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> GmmParams<F, R2> {
        let GmmValidParams {
            n_clusters,
            tolerance,
            reg_covariance,
            n_runs,
            max_n_iterations,
            init,
            ..
        } = self.0;
        GmmParams(GmmValidParams {
            n_clusters,
            tolerance,
            reg_covariance,
            n_runs,
            max_n_iterations,
            init,
            rng,
        })
    }
}

impl<F: Float, R: Rng> ParamGuard for GmmParams<F, R> {
    type Checked = GmmValidParams<F, R>;
    type Error = GmmError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        let problem = if params.n_clusters == 0 {
            Some("n_clusters must be at least 1")
        } else if !(params.tolerance > F::zero()) {
            Some("tolerance must be positive")
        } else if !(params.reg_covariance >= F::zero()) {
            Some("reg_covariance cannot be negative")
        } else if params.n_runs == 0 {
            Some("n_runs must be at least 1")
        } else if params.max_n_iterations == 0 {
            Some("max_n_iterations must be at least 1")
        } else {
            None
        };
        match problem {
            Some(msg) => Err(GmmError::InvalidValue(msg.to_string())),
            None => Ok(params),
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(params: GmmParams<f64, Isaac64Rng>, needle: &str) {
        match params.check() {
            Err(GmmError::InvalidValue(msg)) => assert!(msg.contains(needle), "{}", msg),
            other => panic!("expected InvalidValue for {}, got {:?}", needle, other.map(|_| ())),
        }
    }

    #[test]
    fn defaults_pass_the_check() {
        let params = GmmParams::<f64, _>::new(3).check().unwrap();
        assert_eq!(params.n_clusters(), 3);
        assert_eq!(params.n_runs(), 1);
        assert_eq!(params.max_n_iterations(), 100);
        assert_eq!(params.init_method(), GmmInit::KMeans);
        assert!((params.reg_covariance() - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        rejected(GmmParams::new(0), "n_clusters");
        rejected(GmmParams::new(1).tolerance(0.), "tolerance");
        rejected(GmmParams::new(1).tolerance(f64::NAN), "tolerance");
        rejected(GmmParams::new(1).reg_covariance(-1e-6), "reg_covariance");
        rejected(GmmParams::new(1).n_runs(0), "n_runs");
        rejected(GmmParams::new(1).max_n_iterations(0), "max_n_iterations");
    }

    #[test]
    fn zero_regularization_is_allowed() {
        assert!(GmmParams::<f64, _>::new(1).reg_covariance(0.).check().is_ok());
    }

    #[test]
    fn with_rng_keeps_the_other_parameters() {
        let params = GmmParams::<f64, _>::new(2)
            .n_runs(4)
            .init_method(GmmInit::Random)
            .with_rng(Isaac64Rng::seed_from_u64(1))
            .check()
            .unwrap();
        assert_eq!(params.n_runs(), 4);
        assert_eq!(params.init_method(), GmmInit::Random);
    }
}
