// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while importing one source file.
///
/// Each variant is reported at the per-file boundary; none of them stops the
/// rest of the batch.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The database file is unreachable or corrupt, or a DDL statement failed.
    #[error("storage error while {action}: {source}")]
    Storage {
        action: String,
        #[source]
        source: duckdb::Error,
    },

    /// The source produced no records to append.
    #[error("no records to import into `{table}`")]
    EmptyData { table: String },

    /// The existing table refused the incoming rows.
    #[error("table `{table}` rejected the incoming rows: {detail}")]
    SchemaMismatch {
        table: String,
        detail: String,
        #[source]
        source: Option<duckdb::Error>,
    },

    /// The operator typed something that is not a listed file number.
    #[error("invalid selection `{input}`: {reason}")]
    SelectionInput { input: String, reason: String },

    /// The source file could not be opened or is not well-formed delimited text.
    #[error("cannot read {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ImportError {
    pub(crate) fn storage(action: impl Into<String>, source: duckdb::Error) -> Self {
        ImportError::Storage {
            action: action.into(),
            source,
        }
    }

    pub(crate) fn mismatch(table: &str, source: duckdb::Error) -> Self {
        ImportError::SchemaMismatch {
            table: table.to_string(),
            detail: source.to_string(),
            source: Some(source),
        }
    }

    /// A mismatch caught before anything reached the database.
    pub(crate) fn refused(table: &str, detail: impl Into<String>) -> Self {
        ImportError::SchemaMismatch {
            table: table.to_string(),
            detail: detail.into(),
            source: None,
        }
    }

    /// Short label used in logs and the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Storage { .. } => "storage",
            ImportError::EmptyData { .. } => "empty-data",
            ImportError::SchemaMismatch { .. } => "schema-mismatch",
            ImportError::SelectionInput { .. } => "selection-input",
            ImportError::Source { .. } => "source",
        }
    }
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
