//! The full clustering request: validate, normalize, size, fit and materialize.
//!
//! Every stage runs on the same table, in order, and the first failure aborts the request with
//! no partial output.
mod hyperparams;
mod report;

pub use hyperparams::*;
pub use report::*;

use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use crate::error::{Error, Result};
use crate::gaussian_mixture::GmmParams;
use crate::param_guard::ParamGuard;
use crate::table::{Record, RecordTable};
use crate::{beat_code, clustering, materialize, schema};

/// Cluster `table` and return its rows, in input order, each with an integer `cluster` field.
///
/// `min_points` and `max_points` are the desired cluster size bounds; they only take effect
/// when both are given. All other settings are the [`PipelineParams`] defaults.
///
/// ```
/// use beatmix::{cluster_records, RecordTable};
/// use serde_json::json;
///
/// let table = RecordTable::new(
///     vec!["Latitude".into(), "Longitude".into(), "Beat Code".into()],
///     vec![
///         vec![json!(1.0), json!(1.0), json!("A")],
///         vec![json!(1.1), json!(1.1), json!("a")],
///         vec![json!(50.0), json!(50.0), json!("B")],
///     ],
/// )
/// .unwrap();
///
/// let records = cluster_records(table, None, None).unwrap();
/// assert_eq!(records.len(), 3);
/// assert_eq!(records[0]["cluster"], records[1]["cluster"]);
/// assert_ne!(records[0]["cluster"], records[2]["cluster"]);
/// assert_eq!(records[0]["beat code"], json!("a"));
/// ```
pub fn cluster_records(
    table: RecordTable,
    min_points: Option<i64>,
    max_points: Option<i64>,
) -> Result<Vec<Record>> {
    let report = PipelineParams::new()
        .min_points(min_points)
        .max_points(max_points)
        .run(table)?;
    Ok(report.records)
}

impl PipelineValidParams {
    /// Run every stage on `table` and report the clusters found.
    pub fn run(&self, mut table: RecordTable) -> Result<ClusteringReport> {
        if table.nrows() > self.max_rows() {
            return Err(Error::ResourceLimit(format!(
                "{} rows exceed the limit of {}",
                table.nrows(),
                self.max_rows()
            )));
        }

        schema::validate(&mut table)?;
        let category_column = beat_code::normalize(&mut table)?;
        let n_clusters = self.cluster_count().estimate(&table, &category_column)?;

        if n_clusters > self.max_clusters() {
            return Err(Error::ResourceLimit(format!(
                "{} clusters exceed the limit of {}",
                n_clusters,
                self.max_clusters()
            )));
        }

        let gmm = GmmParams::new_with_rng(n_clusters, Isaac64Rng::seed_from_u64(self.seed()))
            .tolerance(self.tolerance())
            .max_n_iterations(self.max_n_iterations());
        let (table, _) = clustering::fit_predict_with(table, &gmm)?;
        let clusters = summarize(&table, &category_column, n_clusters)?;

        tracing::info!(
            n_rows = table.nrows(),
            n_clusters,
            category_column = %category_column,
            "records clustered"
        );

        Ok(ClusteringReport {
            n_clusters,
            clusters,
            records: materialize::materialize(table),
        })
    }
}

impl PipelineParams {
    /// Check the settings, then [`run`](PipelineValidParams::run).
    pub fn run(&self, table: RecordTable) -> Result<ClusteringReport> {
        self.check_ref()?.run(table)
    }
}
