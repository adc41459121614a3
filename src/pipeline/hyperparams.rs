use crate::cluster_count::ClusterCountParams;
use crate::error::{Error, Result};
use crate::param_guard::ParamGuard;

/// The set of settings of a clustering request.
///
/// Use [`PipelineParams`] to build it; checking makes sure every value is usable before any work
/// is done on the table.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineValidParams {
    cluster_count: ClusterCountParams,
    seed: u64,
    max_rows: usize,
    max_clusters: usize,
    max_n_iterations: u64,
    tolerance: f64,
}

impl PipelineValidParams {
    /// The cluster size bounds
    pub fn cluster_count(&self) -> &ClusterCountParams {
        &self.cluster_count
    }

    /// Seed of the random generator driving the mixture initialization
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Largest accepted number of rows
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Largest accepted number of clusters
    pub fn max_clusters(&self) -> usize {
        self.max_clusters
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

/// A builder for [`PipelineValidParams`].
///
/// ```
/// use beatmix::param_guard::ParamGuard;
/// use beatmix::PipelineParams;
///
/// let params = PipelineParams::new()
///     .min_points(Some(5))
///     .max_points(Some(20))
///     .seed(7)
///     .check()
///     .unwrap();
/// assert_eq!(params.seed(), 7);
///
/// assert!(PipelineParams::new()
///     .min_points(Some(0))
///     .max_points(Some(20))
///     .check()
///     .is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineParams(PipelineValidParams);

impl Default for PipelineParams {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineParams {
    /// Default settings: no size bounds, seed 42, at most 1 000 000 rows and 10 000 clusters,
    /// 100 EM iterations with a tolerance of `1e-3`.
    pub fn new() -> Self {
        PipelineParams(PipelineValidParams {
            cluster_count: ClusterCountParams::new(),
            seed: 42,
            max_rows: 1_000_000,
            max_clusters: 10_000,
            max_n_iterations: 100,
            tolerance: 1e-3,
        })
    }

    /// Desired minimum number of points per cluster
    pub fn min_points(mut self, min_points: Option<i64>) -> Self {
        self.0.cluster_count = self.0.cluster_count.min_points(min_points);
        self
    }

    /// Desired maximum number of points per cluster
    pub fn max_points(mut self, max_points: Option<i64>) -> Self {
        self.0.cluster_count = self.0.cluster_count.max_points(max_points);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.0.max_rows = max_rows;
        self
    }

    pub fn max_clusters(mut self, max_clusters: usize) -> Self {
        self.0.max_clusters = max_clusters;
        self
    }

    /// Maximum number of EM iterations of the mixture fit
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Lower bound gain under which the mixture fit is considered converged
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.0.tolerance = tolerance;
        self
    }
}

impl ParamGuard for PipelineParams {
    type Checked = PipelineValidParams;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.cluster_count.check_ref()?;
        if self.0.max_rows == 0 {
            Err(Error::Parameters("max_rows must be positive".to_string()))
        } else if self.0.max_clusters == 0 {
            Err(Error::Parameters("max_clusters must be positive".to_string()))
        } else if self.0.max_n_iterations == 0 {
            Err(Error::Parameters(
                "max_n_iterations must be positive".to_string(),
            ))
        } else if !(self.0.tolerance.is_finite() && self.0.tolerance > 0.) {
            Err(Error::Parameters(format!(
                "tolerance must be a positive number, got {}",
                self.0.tolerance
            )))
        } else {
            Ok(&self.0)
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

    #[test]
    fn defaults() {
        let params = PipelineParams::new().check().unwrap();
        assert_eq!(params.seed(), 42);
        assert_eq!(params.max_rows(), 1_000_000);
        assert_eq!(params.max_clusters(), 10_000);
        assert_eq!(params.max_n_iterations(), 100);
        assert_eq!(params.tolerance(), 1e-3);
        assert_eq!(params.cluster_count(), &ClusterCountParams::new());
    }

    #[test]
    fn non_positive_bounds_are_parameter_errors() {
        let err = PipelineParams::new()
            .min_points(Some(0))
            .max_points(Some(10))
            .check()
            .unwrap_err();
        assert!(matches!(err, Error::Parameters(_)));
    }

    #[test]
    fn invalid_settings() {
        assert!(PipelineParams::new().max_rows(0).check().is_err());
        assert!(PipelineParams::new().max_clusters(0).check().is_err());
        assert!(PipelineParams::new().max_n_iterations(0).check().is_err());
        assert!(PipelineParams::new().tolerance(0.).check().is_err());
        assert!(PipelineParams::new().tolerance(f64::NAN).check().is_err());
    }
}
