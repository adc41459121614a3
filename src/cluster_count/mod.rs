//! Derivation of the number of mixture components from the data.
//!
//! The base count is the number of distinct beat codes. When both a minimum and a maximum cluster
//! size are supplied, the count is instead
//!
//! ```text
//! k = max(min(n / max_points, c), n / min_points)
//! ```
//!
//! with integer division, `n` the number of rows and `c` the number of distinct beat codes.
//! `n / max_points` is the fewest clusters that keep the average cluster at or under
//! `max_points`; `n / min_points` is the most clusters that keep the average cluster at or above
//! `min_points`. The larger bound wins, so the minimum size is favoured even when it yields more
//! clusters than there are beat codes. These are averages: the mixture model does not enforce
//! per-cluster sizes.
mod errors;
mod hyperparams;

pub use errors::*;
pub use hyperparams::*;

use std::collections::HashSet;

use crate::table::RecordTable;

/// Number of distinct values in the normalized category column
pub fn distinct_beat_codes(table: &RecordTable, column: usize) -> usize {
    table
        .column_values(column)
        .map(crate::beat_code::normalize_beat_code)
        .collect::<HashSet<_>>()
        .len()
}

impl ClusterCountValidParams {
    /// Compute the number of clusters for `table`, whose category column is `category_column`.
    ///
    /// The result is at least 1. An empty table fails with [`ClusterCountError::EmptyTable`].
    pub fn estimate(&self, table: &RecordTable, category_column: &str) -> Result<usize> {
        let column = table
            .column_index(category_column)
            .ok_or_else(|| ClusterCountError::UnknownColumn(category_column.to_string()))?;

        let n_rows = table.nrows();
        if n_rows == 0 {
            return Err(ClusterCountError::EmptyTable);
        }
        let n_codes = distinct_beat_codes(table, column);

        let n_clusters = match self.bounds() {
            Some((min_points, max_points)) => {
                (n_rows / max_points).min(n_codes).max(n_rows / min_points)
            }
            None => n_codes,
        };

        if n_clusters == 0 {
            tracing::debug!(n_rows, n_codes, "computed cluster count is 0, using 1");
        }
        let n_clusters = n_clusters.max(1);
        tracing::debug!(n_rows, n_codes, n_clusters, "cluster count estimated");
        Ok(n_clusters)
    }
}

impl ClusterCountParams {
    /// Check the bounds, then [`estimate`](ClusterCountValidParams::estimate).
    pub fn estimate(&self, table: &RecordTable, category_column: &str) -> Result<usize> {
        use crate::param_guard::ParamGuard;

        self.check_ref()?.estimate(table, category_column)
    }
}
