use crate::cluster_count::errors::{ClusterCountError, Result};
use crate::param_guard::ParamGuard;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// The optional cluster size bounds used to derive the number of clusters.
///
/// The bounds only take effect when both are set.
pub struct ClusterCountValidParams {
    min_points: Option<i64>,
    max_points: Option<i64>,
}

impl ClusterCountValidParams {
    pub fn min_points(&self) -> Option<i64> {
        self.min_points
    }

    pub fn max_points(&self) -> Option<i64> {
        self.max_points
    }

    /// `(min_points, max_points)` when both bounds are set. Only meaningful on checked
    /// parameters, where both are known to be positive.
    pub(crate) fn bounds(&self) -> Option<(usize, usize)> {
        match (self.min_points, self.max_points) {
            (Some(min), Some(max)) => Some((min as usize, max as usize)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// An helper struct used to construct a set of [valid bounds](ClusterCountValidParams)
/// (using the builder pattern).
pub struct ClusterCountParams(ClusterCountValidParams);

impl ClusterCountParams {
    /// No bounds: one cluster per distinct beat code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired minimum number of points per cluster
    pub fn min_points(mut self, min_points: Option<i64>) -> Self {
        self.0.min_points = min_points;
        self
    }

    /// Desired maximum number of points per cluster
    pub fn max_points(mut self, max_points: Option<i64>) -> Self {
        self.0.max_points = max_points;
        self
    }
}

impl ParamGuard for ClusterCountParams {
    type Checked = ClusterCountValidParams;
    type Error = ClusterCountError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if let (Some(min), Some(max)) = (self.0.min_points, self.0.max_points) {
            if min <= 0 {
                return Err(ClusterCountError::NonPositiveBound {
                    name: "min_points",
                    value: min,
                });
            }
            if max <= 0 {
                return Err(ClusterCountError::NonPositiveBound {
                    name: "max_points",
                    value: max,
                });
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
