pub mod derive;
pub mod types;

pub use derive::{classify_column, column_name, infer_schema};
pub use types::{Column, ColumnKind, TableSchema, IDENTITY_COLUMN};
