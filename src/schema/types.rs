// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the auto-assigned primary key prepended to every table.
pub const IDENTITY_COLUMN: &str = "id";

/// Storage class inferred for one column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
        }
    }

    /// DuckDB column type used when the table is created.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "BIGINT",
            ColumnKind::Real => "DOUBLE",
            ColumnKind::Text => "VARCHAR",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column definition of a table schema.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Table name plus its data columns. The identity column is implicit and
/// always comes first when the table is created.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<Column>,
}
