//! Turn the labelled table back into the records the caller receives.

use crate::table::{Record, RecordTable};

/// Turn a table into one record per row, in row order, each record keyed by column name in
/// column order.
pub fn materialize(table: RecordTable) -> Vec<Record> {
    let (columns, rows) = table.into_parts();
    rows.into_iter()
        .map(|row| columns.iter().cloned().zip(row).collect())
        .collect()
}
