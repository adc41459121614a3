//! Structural validation of a [`RecordTable`] before clustering.

use std::collections::HashSet;

use thiserror::Error;

use crate::table::RecordTable;

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
/// Accepted spellings of the category column, in order of preference
pub const BEAT_CODE_VARIANTS: [&str; 2] = ["beatcode", "beat code"];

/// An error when the table does not have the shape the pipeline needs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Coordinate columns absent from the table, in `latitude`, `longitude` order
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Missing required column: beatcode (or 'beat code')")]
    MissingCategoryColumn,
    /// Two columns share a name once lower-cased
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Lower-case every column name of `table` in place, then check that the coordinate columns and
/// a category column are present.
///
/// Row values are not inspected.
pub fn validate(table: &mut RecordTable) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(table.ncols());
    for column in table.columns_mut() {
        *column = column.to_lowercase();
        if !seen.insert(column.clone()) {
            return Err(SchemaError::DuplicateColumn(column.clone()));
        }
    }

    let missing: Vec<String> = [LATITUDE, LONGITUDE]
        .iter()
        .filter(|required| !seen.contains(**required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    if !BEAT_CODE_VARIANTS
        .iter()
        .any(|variant| seen.contains(*variant))
    {
        return Err(SchemaError::MissingCategoryColumn);
    }

    tracing::debug!(columns = table.ncols(), rows = table.nrows(), "schema validated");
    Ok(())
}
