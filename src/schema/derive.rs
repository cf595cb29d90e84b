use tracing::debug;

use super::{Column, ColumnKind, TableSchema};
use crate::process::dataset::Dataset;

/// Classify one column from its raw cells (`None` = null marker).
///
/// Candidates are tried in order and the first one every non-null cell
/// parses under wins:
///  1. `i64`  ⇒ INTEGER
///  2. `f64`  ⇒ REAL
///  3. anything else ⇒ TEXT
///
/// A column with no non-null cell is TEXT.
pub fn classify_column<'a, I>(cells: I) -> ColumnKind
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = false;
    let mut all_int = true;

    for cell in cells.into_iter().flatten() {
        seen = true;
        // the csv reader has already removed quoting
        let v = cell.trim();
        if all_int && v.parse::<i64>().is_err() {
            all_int = false;
        }
        if !all_int && v.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }

    match (seen, all_int) {
        (false, _) => ColumnKind::Text,
        (true, true) => ColumnKind::Integer,
        (true, false) => ColumnKind::Real,
    }
}

/// SQL-facing column name: spaces become underscores.
pub fn column_name(raw: &str) -> String {
    raw.replace(' ', "_")
}

/// Build the table schema for `dataset`. Never fails.
pub fn infer_schema(dataset: &Dataset, table_name: &str) -> TableSchema {
    let columns = dataset
        .columns()
        .iter()
        .map(|col| {
            let kind = col.values.kind();
            debug!("infer_schema: `{}`.`{}` → {}", table_name, col.name, kind);
            Column {
                name: column_name(&col.name),
                kind,
            }
        })
        .collect();

    TableSchema {
        table_name: table_name.to_string(),
        columns,
    }
}
