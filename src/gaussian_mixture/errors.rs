use crate::k_means::KMeansError;
use linfa_linalg::LinalgError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GmmError>;

/// Failure while checking parameters for, or fitting, a [`GaussianMixtureModel`](super::GaussianMixtureModel)
#[derive(Error, Debug)]
pub enum GmmError {
    #[error("invalid mixture parameter: {0}")]
    InvalidValue(String),
    /// A covariance matrix is not positive definite, which happens when a component collapses
    /// onto identical points and `reg_covariance` is 0.
    #[error("covariance of a component is not positive definite ({0}); raise reg_covariance")]
    Linalg(#[from] LinalgError),
    #[error("k-means initialization failed: {0}")]
    Initialization(#[from] KMeansError),
    /// Every run ended with a log-likelihood that is not a number
    #[error("no run produced a finite log-likelihood")]
    DegenerateLikelihood,
}
