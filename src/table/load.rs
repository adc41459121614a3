use std::io;

use csv::ReaderBuilder;
use serde_json::{Number, Value};
use thiserror::Error;

use super::{Record, RecordTable};

/// An error when reading a table from an external format
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON document is neither an object nor an array of objects
    #[error("expected a JSON object or an array of objects")]
    NotRecords,
}

/// Type shared by all the non-empty cells of a CSV column
#[derive(Clone, Copy, Debug, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    fn of(cell: &str) -> ColumnKind {
        if cell.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if parse_bool(cell).is_some() {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        }
    }

    fn merge(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn float_cell(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

/// Convert one raw cell according to the kind inferred for its column.
///
/// An integer column with missing cells is read as a float column, and numeric text in a text
/// column stays text.
fn typed_cell(cell: &str, kind: ColumnKind, has_missing: bool) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer if !has_missing => cell
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnKind::Integer | ColumnKind::Float => cell
            .parse::<f64>()
            .map(float_cell)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnKind::Boolean => parse_bool(cell)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

impl RecordTable {
    /// Read a table from CSV data with a header row.
    ///
    /// Cell types are inferred per column: a column whose non-empty cells are all integers
    /// holds integers, all numeric holds floats, all `true`/`false` holds booleans, anything
    /// else holds strings. Empty cells become `null`.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<RecordTable, LoadError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let raw = reader
            .records()
            .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

        let mut kinds: Vec<Option<ColumnKind>> = vec![None; columns.len()];
        let mut missing = vec![false; columns.len()];
        for record in &raw {
            for (idx, cell) in record.iter().enumerate() {
                if cell.is_empty() {
                    missing[idx] = true;
                    continue;
                }
                let kind = ColumnKind::of(cell);
                kinds[idx] = Some(match kinds[idx] {
                    Some(seen) => seen.merge(kind),
                    None => kind,
                });
            }
        }

        let rows = raw
            .iter()
            .map(|record| {
                record
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        typed_cell(cell, kinds[idx].unwrap_or(ColumnKind::Text), missing[idx])
                    })
                    .collect()
            })
            .collect();

        Ok(RecordTable { columns, rows })
    }

    /// Read a table from a JSON document holding either one object or an array of objects.
    pub fn from_json_reader<R: io::Read>(reader: R) -> Result<RecordTable, LoadError> {
        let document: Value = serde_json::from_reader(reader)?;
        let records = match document {
            Value::Object(record) => vec![record],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    _ => Err(LoadError::NotRecords),
                })
                .collect::<Result<Vec<Record>, LoadError>>()?,
            _ => return Err(LoadError::NotRecords),
        };
        Ok(RecordTable::from_records(records))
    }
}
