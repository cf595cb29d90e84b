// src/process/mod.rs
use csv::ReaderBuilder;
use std::{collections::HashMap, io, path::Path};
use tracing::{debug, warn};

pub mod dataset;
pub mod raw_table;
pub mod utils;

pub use dataset::{ColumnValues, Dataset, DatasetColumn};
pub use raw_table::RawTable;

use crate::error::{ImportError, ImportResult};
use utils::{delimiter_for, is_null_token, table_name_for};

/// Read a delimited text file into memory.
///
/// - The first record is the header; names are trimmed, blanks become
///   `Unnamed_<idx>` and repeats get a `_<n>` suffix.
/// - Short records are padded with nulls; long records are an error.
/// - Null spellings (see [`utils::is_null_token`]) become `None`.
///
/// A file without even a header record is [`ImportError::EmptyData`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn load_delimited(path: &Path) -> ImportResult<RawTable> {
    let source_err = |source: csv::Error| ImportError::Source {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // short rows are padded below
        .delimiter(delimiter_for(path))
        .from_path(path)
        .map_err(source_err)?;

    let mut records = rdr.records();
    let header = match records.next() {
        Some(rec) => rec.map_err(source_err)?,
        None => {
            return Err(ImportError::EmptyData {
                table: table_name_for(path),
            })
        }
    };
    let headers = normalise_headers(header.iter());

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(source_err)?;
        if record.len() > headers.len() {
            let msg = format!(
                "record {} has {} fields, header has {}",
                idx + 1,
                record.len(),
                headers.len()
            );
            return Err(source_err(io::Error::new(io::ErrorKind::InvalidData, msg).into()));
        }
        if record.len() < headers.len() {
            debug!(record = idx + 1, fields = record.len(), "padding short record");
        }

        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| (!is_null_token(cell)).then(|| cell.to_string()))
            .collect();
        row.resize(headers.len(), None);
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), "loaded");
    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows,
    })
}

fn normalise_headers<'a, I>(raw: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();

    for (idx, name) in raw.enumerate() {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed_{}", idx)
        } else {
            trimmed.to_string()
        };

        let count = seen.entry(base.clone()).or_insert(0);
        let unique = if *count == 0 {
            base.clone()
        } else {
            warn!(header = %base, "duplicate header renamed");
            format!("{}_{}", base, count)
        };
        *count += 1;
        out.push(unique);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;
    use anyhow::Result;
    use std::fs;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,tabload::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn loads_headers_and_rows() -> Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sales.csv");
        fs::write(&path, "qty,note\n1,\"a, quoted\"\n2,b\n3,\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.headers, vec!["qty", "note"]);
        assert_eq!(raw.row_count(), 3);
        assert_eq!(raw.rows[0], vec![Some("1".into()), Some("a, quoted".into())]);
        assert_eq!(raw.rows[2], vec![Some("3".into()), None]);
        Ok(())
    }

    #[test]
    fn escaped_quotes_stay_in_text() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("codes.csv");
        fs::write(&path, "code,n\n\"\"\"5\"\"\",\"7\"\n\"\"\"6\"\"\",8\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.rows[0], vec![Some("\"5\"".into()), Some("7".into())]);

        let ds = Dataset::from_raw(&raw);
        assert_eq!(ds.columns()[0].values.kind(), ColumnKind::Text);
        assert_eq!(ds.columns()[1].values.kind(), ColumnKind::Integer);
        assert_eq!(
            ds.columns()[0].values,
            ColumnValues::Text(vec![Some("\"5\"".into()), Some("\"6\"".into())])
        );
        Ok(())
    }

    #[test]
    fn tsv_uses_tab_delimiter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("readings.tsv");
        fs::write(&path, "sensor\tvalue\nA\t1.5\nB\t2\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.headers, vec!["sensor", "value"]);
        assert_eq!(raw.rows[1], vec![Some("B".into()), Some("2".into())]);
        Ok(())
    }

    #[test]
    fn null_spellings_become_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("n.csv");
        fs::write(&path, "a,b,c\nNA,NaN,null\n1,2,3\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.rows[0], vec![None, None, None]);
        Ok(())
    }

    #[test]
    fn short_rows_are_padded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("short.csv");
        fs::write(&path, "a,b,c\n1\n1,2,3\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.rows[0], vec![Some("1".into()), None, None]);
        Ok(())
    }

    #[test]
    fn long_rows_are_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("long.csv");
        fs::write(&path, "a,b\n1,2,3\n")?;

        let err = load_delimited(&path).unwrap_err();
        assert!(matches!(err, ImportError::Source { .. }), "got {err:?}");
        Ok(())
    }

    #[test]
    fn blank_and_duplicate_headers_are_renamed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("h.csv");
        fs::write(&path, " x ,,x,x\n1,2,3,4\n")?;

        let raw = load_delimited(&path)?;
        assert_eq!(raw.headers, vec!["x", "Unnamed_1", "x_1", "x_2"]);
        Ok(())
    }

    #[test]
    fn empty_file_is_empty_data() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nothing.csv");
        fs::write(&path, "")?;

        match load_delimited(&path) {
            Err(ImportError::EmptyData { table }) => assert_eq!(table, "nothing"),
            other => panic!("expected EmptyData, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_file_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_delimited(&dir.path().join("gone.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Source { .. }));
    }
}
