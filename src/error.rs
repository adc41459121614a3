//! Error types in beatmix
//!
//! Every stage of the pipeline has its own error type; all of them convert
//! into the crate-level [`Error`] so `?` can be used across stages.

use thiserror::Error;

use crate::cluster_count::ClusterCountError;
use crate::gaussian_mixture::GmmError;
use crate::k_means::KMeansError;
use crate::schema::SchemaError;
use crate::table::LoadError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Required columns are missing or the table is malformed
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The input could not be read into a table
    #[error("could not load records: {0}")]
    Load(#[from] LoadError),
    /// Size bounds or pipeline settings are invalid
    #[error("invalid parameter: {0}")]
    Parameters(String),
    /// The request exceeds the configured row or cluster limits
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
    /// Anything the caller cannot fix by correcting the request shape
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `true` for errors the caller can fix by changing the input
    /// (schema, parameters, resource limits), `false` for internal failures.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }
}

impl From<ClusterCountError> for Error {
    fn from(err: ClusterCountError) -> Self {
        match err {
            ClusterCountError::UnknownColumn(_) => Error::Internal(err.to_string()),
            _ => Error::Parameters(err.to_string()),
        }
    }
}

impl From<GmmError> for Error {
    fn from(err: GmmError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<KMeansError> for Error {
    fn from(err: KMeansError) -> Self {
        Error::Internal(err.to_string())
    }
}
