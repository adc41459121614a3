use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterCountError>;

/// An error when deriving the number of clusters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterCountError {
    /// When a size bound is supplied but is not strictly positive
    #[error("min_points and max_points must be positive integers (got {name} = {value})")]
    NonPositiveBound { name: &'static str, value: i64 },
    #[error("cannot derive a cluster count from an empty table")]
    EmptyTable,
    #[error("category column `{0}` not found")]
    UnknownColumn(String),
}
