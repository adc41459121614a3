use std::collections::BTreeSet;

use serde::Serialize;

use crate::clustering::{coordinates, CLUSTER_COLUMN};
use crate::error::{Error, Result};
use crate::table::{cell_to_string, Record, RecordTable};

/// Mean position of the members of a cluster
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
}

/// What a single cluster holds
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    /// Number of rows assigned to the cluster
    pub size: usize,
    /// `None` for a cluster no row was assigned to
    pub centroid: Option<Centroid>,
    /// Distinct beat codes of the members, sorted
    pub beat_codes: Vec<String>,
}

/// Outcome of a clustering request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusteringReport {
    pub n_clusters: usize,
    /// One entry per cluster label in `0..n_clusters`
    pub clusters: Vec<ClusterSummary>,
    /// The input rows, in input order, with their `cluster` assignment
    pub records: Vec<Record>,
}

/// Group the rows of a clustered table by their `cluster` label.
///
/// `category_column` names the normalized beat code column. Every label in `0..n_clusters` gets
/// an entry, even when no row carries it.
pub fn summarize(
    table: &RecordTable,
    category_column: &str,
    n_clusters: usize,
) -> Result<Vec<ClusterSummary>> {
    let missing = |name: &str| Error::Internal(format!("column `{}` not found", name));
    let cluster_column = table
        .column_index(CLUSTER_COLUMN)
        .ok_or_else(|| missing(CLUSTER_COLUMN))?;
    let category_column = table
        .column_index(category_column)
        .ok_or_else(|| missing(category_column))?;
    let observations = coordinates(table)?;

    let mut sizes = vec![0; n_clusters];
    let mut sums = vec![(0., 0.); n_clusters];
    let mut codes = vec![BTreeSet::new(); n_clusters];

    let labels = table.column_values(cluster_column);
    let categories = table.column_values(category_column);
    for ((row, label), category) in labels.enumerate().zip(categories) {
        let label = label
            .as_u64()
            .map(|label| label as usize)
            .filter(|&label| label < n_clusters)
            .ok_or_else(|| {
                Error::Internal(format!("invalid cluster label {} in row {}", label, row))
            })?;
        sizes[label] += 1;
        sums[label].0 += observations[[row, 0]];
        sums[label].1 += observations[[row, 1]];
        codes[label].insert(cell_to_string(category));
    }

    Ok(sizes
        .into_iter()
        .zip(sums)
        .zip(codes)
        .enumerate()
        .map(|(cluster, ((size, (lat, lon)), codes))| ClusterSummary {
            cluster,
            size,
            centroid: if size > 0 {
                Some(Centroid {
                    latitude: lat / size as f64,
                    longitude: lon / size as f64,
                })
            } else {
                None
            },
            beat_codes: codes.into_iter().collect(),
        })
        .collect())
}
