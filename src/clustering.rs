//! Fit a Gaussian mixture on the coordinates of a table and label every row.

use ndarray::Array2;
use rand_isaac::Isaac64Rng;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gaussian_mixture::{GaussianMixtureModel, GmmError, GmmParams};
use crate::schema::{LATITUDE, LONGITUDE};
use crate::table::{cell_to_f64, RecordTable};
use crate::traits::{Fit, Predict};

/// Name of the column holding the cluster assignment
pub const CLUSTER_COLUMN: &str = "cluster";

/// Extract the `(latitude, longitude)` matrix of a validated table, shape `(n_rows, 2)`.
///
/// Fails with [`Error::Internal`] on the first cell that is not a finite number.
pub fn coordinates(table: &RecordTable) -> Result<Array2<f64>> {
    let mut features = Array2::zeros((table.nrows(), 2));
    for (col, name) in [LATITUDE, LONGITUDE].iter().enumerate() {
        let index = table
            .column_index(name)
            .ok_or_else(|| Error::Internal(format!("column `{}` not found", name)))?;
        for (row, value) in table.column_values(index).enumerate() {
            features[[row, col]] = cell_to_f64(value).ok_or_else(|| {
                Error::Internal(format!(
                    "could not convert {} to a number in column `{}`, row {}",
                    value, name, row
                ))
            })?;
        }
    }
    Ok(features)
}

/// Fit a mixture of `n_clusters` Gaussians with the default parameters (seed 42) and write the
/// most likely component of every row into the `cluster` column.
pub fn fit_predict(
    table: RecordTable,
    n_clusters: usize,
) -> Result<(RecordTable, GaussianMixtureModel<f64>)> {
    fit_predict_with(table, &GmmParams::new(n_clusters))
}

/// Same as [`fit_predict`], with explicit mixture parameters.
///
/// An existing `cluster` column is overwritten in place, otherwise `cluster` is appended as the
/// last column.
pub fn fit_predict_with(
    mut table: RecordTable,
    params: &GmmParams<f64, Isaac64Rng>,
) -> Result<(RecordTable, GaussianMixtureModel<f64>)> {
    let observations = coordinates(&table)?;
    let model = Fit::<_, GmmError>::fit(params, &observations)?;
    let memberships = model.predict(&observations);

    tracing::debug!(
        n_rows = table.nrows(),
        n_clusters = model.n_clusters(),
        "mixture fitted"
    );

    let labels = memberships.iter().map(|&label| Value::from(label)).collect();
    table.set_column(CLUSTER_COLUMN, labels);
    Ok((table, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<Vec<Value>>) -> RecordTable {
        RecordTable::new(
            vec![
                "latitude".to_string(),
                "longitude".to_string(),
                "beatcode".to_string(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn coordinates_accept_numeric_text() {
        let t = table(vec![
            vec![json!(1), json!("2.5"), json!("a")],
            vec![json!(3.5), json!(4), json!("b")],
        ]);
        let features = coordinates(&t).unwrap();
        assert_eq!(features, ndarray::array![[1., 2.5], [3.5, 4.]]);
    }

    #[test]
    fn non_numeric_coordinates_are_internal_errors() {
        let t = table(vec![vec![json!(1), json!("north"), json!("a")]]);
        let err = coordinates(&t).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(!err.is_caller_error());

        let t = table(vec![vec![Value::Null, json!(1), json!("a")]]);
        assert!(matches!(coordinates(&t), Err(Error::Internal(_))));
    }

    #[test]
    fn cluster_column_is_appended() {
        let t = table(vec![
            vec![json!(1.), json!(1.), json!("a")],
            vec![json!(1.1), json!(1.1), json!("a")],
            vec![json!(50.), json!(50.), json!("b")],
        ]);
        let (t, model) = fit_predict(t, 2).unwrap();
        assert_eq!(model.n_clusters(), 2);
        assert_eq!(t.columns().last().map(String::as_str), Some(CLUSTER_COLUMN));

        let labels: Vec<u64> = t
            .column_values(3)
            .map(|v| v.as_u64().unwrap())
            .collect();
        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn existing_cluster_column_is_overwritten() {
        let t = RecordTable::new(
            vec![
                "cluster".to_string(),
                "latitude".to_string(),
                "longitude".to_string(),
            ],
            vec![
                vec![json!(9), json!(0.), json!(0.)],
                vec![json!(9), json!(0.5), json!(0.5)],
            ],
        )
        .unwrap();
        let (t, _) = fit_predict(t, 1).unwrap();
        assert_eq!(t.ncols(), 3);
        let labels: Vec<_> = t.column_values(0).cloned().collect();
        assert_eq!(labels, vec![json!(0), json!(0)]);
    }

    #[test]
    fn too_many_components_is_an_internal_error() {
        let t = table(vec![vec![json!(1.), json!(1.), json!("a")]]);
        assert!(matches!(fit_predict(t, 2), Err(Error::Internal(_))));
    }
}
