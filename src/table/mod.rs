//! The in-memory record table handed to the clustering pipeline.
//!
//! A [`RecordTable`] is column-major in naming and row-major in storage: the column names are
//! kept once, every row holds exactly one [`Value`] per column. Row order is the natural
//! iteration order and is never changed by any stage of the pipeline.

mod load;

pub use load::LoadError;

use serde_json::{Map, Value};

use crate::schema::SchemaError;

/// A single output (or input) record, mapping column names to cell values in column order.
pub type Record = Map<String, Value>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    /// Build a table from column names and rows.
    ///
    /// Fails with [`SchemaError::RaggedRow`] if any row does not have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SchemaError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(SchemaError::RaggedRow {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(RecordTable { columns, rows })
    }

    /// Build a table from a sequence of records.
    ///
    /// Columns are the union of all record keys, in the order they are first seen. Keys absent
    /// from a record become `null` cells.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| record.remove(column).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        RecordTable { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column with exactly this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Iterate over the cells of one column, in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.rows.iter().map(|row| row.as_slice())
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [String] {
        &mut self.columns
    }

    /// Apply `f` to every cell of one column, in place
    pub(crate) fn map_column_inplace(&mut self, index: usize, mut f: impl FnMut(&Value) -> Value) {
        for row in self.rows.iter_mut() {
            row[index] = f(&row[index]);
        }
    }

    /// Write `values` into the column `name`, overwriting it if it already exists and appending
    /// it as the last column otherwise. `values` must have one entry per row.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Consume the table, returning its column names and rows
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// The textual form a cell takes when it is coerced to a string.
///
/// Missing cells read as `nan`, the way an empty spreadsheet cell reads once a whole column is
/// coerced to text.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => "nan".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Numeric reading of a cell: numbers as they are, strings if they parse as a float.
/// Non-finite values are rejected.
pub fn cell_to_f64(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = RecordTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![json!(1), json!(2)], vec![json!(3)]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn records_union_their_keys_in_first_seen_order() {
        let table = RecordTable::from_records(vec![
            record(json!({"Latitude": 1.0, "beatcode": "A"})),
            record(json!({"Longitude": 2.0, "Latitude": 3.0})),
        ]);
        assert_eq!(table.columns(), &["Latitude", "beatcode", "Longitude"]);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0], &[json!(1.0), json!("A"), Value::Null][..]);
        assert_eq!(rows[1], &[json!(3.0), Value::Null, json!(2.0)][..]);
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut table =
            RecordTable::new(vec!["a".to_string()], vec![vec![json!(1)], vec![json!(2)]]).unwrap();
        table.set_column("cluster", vec![json!(0), json!(1)]);
        assert_eq!(table.columns(), &["a", "cluster"]);
        table.set_column("cluster", vec![json!(5), json!(6)]);
        assert_eq!(table.ncols(), 2);
        let clusters: Vec<_> = table.column_values(1).cloned().collect();
        assert_eq!(clusters, vec![json!(5), json!(6)]);
    }

    #[test]
    fn cells_coerce_to_text() {
        assert_eq!(cell_to_string(&json!("A1")), "A1");
        assert_eq!(cell_to_string(&json!(101)), "101");
        assert_eq!(cell_to_string(&json!(101.5)), "101.5");
        assert_eq!(cell_to_string(&json!(true)), "true");
        assert_eq!(cell_to_string(&Value::Null), "nan");
    }

    #[test]
    fn cells_coerce_to_numbers() {
        assert_eq!(cell_to_f64(&json!(12)), Some(12.));
        assert_eq!(cell_to_f64(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(cell_to_f64(&json!("north")), None);
        assert_eq!(cell_to_f64(&json!("NaN")), None);
        assert_eq!(cell_to_f64(&Value::Null), None);
        assert_eq!(cell_to_f64(&json!(false)), None);
    }
}
