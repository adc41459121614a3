//! Provide traits for the different stages of a clustering run
//!

/// Fittable algorithms
///
/// A fittable algorithm takes a set of records and creates an object, which can be used to
/// assign new observations to clusters.
pub trait Fit<R, E: std::error::Error> {
    type Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E>;
}

/// Predict with a fitted model
///
/// Consumes or borrows a set of observations and returns the cluster each observation is
/// assigned to.
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}
