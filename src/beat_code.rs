//! Locate the beat code column and bring its values to one canonical spelling.

use serde_json::Value;

use crate::schema::{SchemaError, BEAT_CODE_VARIANTS};
use crate::table::{cell_to_string, RecordTable};

/// Find the category column of a validated table.
///
/// A column named exactly `beatcode` wins over `beat code`; among columns matching the same
/// spelling, the first in column order wins.
pub fn find_beat_code_column(table: &RecordTable) -> Option<usize> {
    BEAT_CODE_VARIANTS.iter().find_map(|variant| {
        table
            .columns()
            .iter()
            .position(|column| column.to_lowercase() == *variant)
    })
}

/// Canonical form of a category cell: its string form, lower-cased.
pub fn normalize_beat_code(value: &Value) -> String {
    cell_to_string(value).to_lowercase()
}

/// Locate the category column and rewrite every one of its cells to the normalized category
/// value, so that `"A1"`, `"a1"` compare equal. Returns the column name.
pub fn normalize(table: &mut RecordTable) -> Result<String, SchemaError> {
    let index = find_beat_code_column(table).ok_or(SchemaError::MissingCategoryColumn)?;
    table.map_column_inplace(index, |value| Value::String(normalize_beat_code(value)));

    let name = table.columns()[index].clone();
    tracing::debug!(column = %name, "beat codes normalized");
    Ok(name)
}
