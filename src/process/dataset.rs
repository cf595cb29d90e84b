use duckdb::types::Value;
use tracing::debug;

use super::raw_table::RawTable;
use crate::schema::{classify_column, ColumnKind};

/// Typed cells of one column. `None` is the null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Integer(Vec<Option<i64>>),
    Real(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Integer(_) => ColumnKind::Integer,
            ColumnValues::Real(_) => ColumnKind::Real,
            ColumnValues::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Real(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `row` as a DuckDB parameter value.
    pub fn value_at(&self, row: usize) -> Value {
        let cell = match self {
            ColumnValues::Integer(v) => v.get(row).copied().flatten().map(Value::BigInt),
            ColumnValues::Real(v) => v.get(row).copied().flatten().map(Value::Double),
            ColumnValues::Text(v) => v.get(row).cloned().flatten().map(Value::Text),
        };
        cell.unwrap_or(Value::Null)
    }

    fn from_cells<'a, I>(kind: ColumnKind, cells: I) -> Self
    where
        I: Iterator<Item = Option<&'a str>>,
    {
        match kind {
            ColumnKind::Integer => ColumnValues::Integer(
                cells
                    .map(|c| c.and_then(|s| s.trim().parse().ok()))
                    .collect(),
            ),
            ColumnKind::Real => ColumnValues::Real(
                cells
                    .map(|c| c.and_then(|s| s.trim().parse().ok()))
                    .collect(),
            ),
            ColumnKind::Text => ColumnValues::Text(cells.map(|c| c.map(str::to_string)).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetColumn {
    pub name: String,
    pub values: ColumnValues,
}

/// Column-oriented, typed contents of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<DatasetColumn>,
    row_count: usize,
}

impl Dataset {
    /// All columns must have the same length.
    pub fn new(columns: Vec<DatasetColumn>) -> Self {
        let row_count = columns.first().map_or(0, |c| c.values.len());
        debug_assert!(
            columns.iter().all(|c| c.values.len() == row_count),
            "dataset columns must be aligned"
        );
        Self { columns, row_count }
    }

    /// Classify every raw column and convert its cells to the chosen kind.
    pub fn from_raw(raw: &RawTable) -> Self {
        let columns = raw
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = classify_column(raw.column(idx));
                debug!(column = %name, %kind, "classified column");
                DatasetColumn {
                    name: name.clone(),
                    values: ColumnValues::from_cells(kind, raw.column(idx)),
                }
            })
            .collect();
        Self {
            columns,
            row_count: raw.row_count(),
        }
    }

    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Record `idx` across all columns, in column order.
    pub fn row(&self, idx: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.values.value_at(idx)).collect()
    }
}
