// src/duck/mod.rs
use duckdb::{appender_params_from_iter, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ImportError, ImportResult};
use crate::process::{self, utils::table_name_for, ColumnValues, Dataset};
use crate::schema::{column_name, infer_schema, TableSchema, IDENTITY_COLUMN};

/// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
pub fn open_disk_db(path: &Path) -> ImportResult<Connection> {
    Connection::open(path)
        .map_err(|e| ImportError::storage(format!("opening {}", path.display()), e))
}

/// Open a DuckDB in-memory database
pub fn open_mem_db() -> ImportResult<Connection> {
    Connection::open_in_memory().map_err(|e| ImportError::storage("opening in-memory db", e))
}

/// Make sure a database file exists at `path`, then release it.
pub fn create_database(path: &Path) -> ImportResult<()> {
    let existed = path.exists();
    let conn = open_disk_db(path)?;
    drop(conn);
    if existed {
        debug!(path = %path.display(), "database already present");
    } else {
        info!(path = %path.display(), "database created");
    }
    Ok(())
}

/// Double-quote an identifier for DuckDB.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the sequence that feeds a table's identity column.
///
/// Always a plain lowercase identifier starting with a letter, so it can be
/// written unquoted inside `nextval('...')` whatever the table is called.
fn sequence_name(table_name: &str) -> String {
    let safe: String = table_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("seq_{}_{}", safe, IDENTITY_COLUMN)
}

/// DDL for `schema`: an identity sequence and the table itself, both
/// guarded by `IF NOT EXISTS`.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let seq = sequence_name(&schema.table_name);
    let mut cols = vec![format!(
        "{} BIGINT PRIMARY KEY DEFAULT nextval('{}')",
        IDENTITY_COLUMN, seq
    )];
    cols.extend(
        schema
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type())),
    );

    format!(
        "CREATE SEQUENCE IF NOT EXISTS {seq};\n\
         CREATE TABLE IF NOT EXISTS {table} (\n    {cols}\n);",
        seq = quote_ident(&seq),
        table = quote_ident(&schema.table_name),
        cols = cols.join(",\n    ")
    )
}

/// Create the table for `schema` unless one with that name already exists.
/// An existing table is left untouched even if its columns differ.
pub fn ensure_table(conn: &Connection, schema: &TableSchema) -> ImportResult<()> {
    let sql = create_table_sql(schema);
    debug!(table = %schema.table_name, %sql, "ensure_table");
    conn.execute_batch(&sql).map_err(|e| {
        ImportError::storage(format!("creating table `{}`", schema.table_name), e)
    })
}

/// Declared type of every column of `table_name`, keyed by column name.
pub fn table_column_types(
    conn: &Connection,
    table_name: &str,
) -> ImportResult<HashMap<String, String>> {
    let lookup = || -> duckdb::Result<HashMap<String, String>> {
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = ?",
        )?;
        let rows = stmt.query_map(duckdb::params![table_name], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        rows.collect()
    };
    lookup().map_err(|e| ImportError::storage(format!("reading columns of `{}`", table_name), e))
}

fn is_integer_type(sql_type: &str) -> bool {
    matches!(
        sql_type,
        "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "HUGEINT"
            | "UTINYINT" | "USMALLINT" | "UINTEGER" | "UBIGINT" | "UHUGEINT"
    )
}

/// Reject fractional values headed for an integer column. The appender
/// would otherwise round them silently.
fn check_integer_columns(
    conn: &Connection,
    table_name: &str,
    dataset: &Dataset,
) -> ImportResult<()> {
    let types = table_column_types(conn, table_name)?;
    for column in dataset.columns() {
        let ColumnValues::Real(values) = &column.values else {
            continue;
        };
        let name = column_name(&column.name);
        let Some(sql_type) = types.get(&name) else {
            continue;
        };
        if !is_integer_type(sql_type) {
            continue;
        }
        if let Some(v) = values.iter().flatten().find(|v| !v.is_finite() || v.fract() != 0.0) {
            return Err(ImportError::refused(
                table_name,
                format!("column `{}` is {} but got {}", name, sql_type, v),
            ));
        }
    }
    Ok(())
}

/// Append every record of `dataset` to `table_name` in one transaction,
/// leaving `id` to the sequence. Returns the number of rows written.
///
/// Rows go through a DuckDB appender restricted to the data columns. Any
/// appender failure (unknown column, value the column type refuses) is a
/// schema mismatch and rolls the whole call back.
pub fn append_rows(
    conn: &mut Connection,
    table_name: &str,
    dataset: &Dataset,
) -> ImportResult<usize> {
    if dataset.is_empty() {
        return Err(ImportError::EmptyData {
            table: table_name.to_string(),
        });
    }

    check_integer_columns(conn, table_name, dataset)?;

    let names: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| column_name(&c.name))
        .collect();
    let columns: Vec<&str> = names.iter().map(String::as_str).collect();

    let tx = conn
        .transaction()
        .map_err(|e| ImportError::storage("starting transaction", e))?;
    {
        // appender must be flushed and dropped before commit
        let mut appender = tx
            .appender_with_columns(table_name, &columns)
            .map_err(|e| ImportError::mismatch(table_name, e))?;
        let rows = (0..dataset.row_count()).map(|idx| appender_params_from_iter(dataset.row(idx)));
        appender
            .append_rows(rows)
            .map_err(|e| ImportError::mismatch(table_name, e))?;
        appender
            .flush()
            .map_err(|e| ImportError::mismatch(table_name, e))?;
    }
    tx.commit()
        .map_err(|e| ImportError::storage(format!("committing rows to `{}`", table_name), e))?;

    Ok(dataset.row_count())
}

/// Row count of `table_name`.
pub fn count_rows(conn: &Connection, table_name: &str) -> ImportResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table_name));
    conn.query_row(&sql, [], |r| r.get(0))
        .map_err(|e| ImportError::storage(format!("counting rows of `{}`", table_name), e))
}

/// Turns one dataset into rows of one table in the database file.
///
/// A connection is opened for every call and closed again before it
/// returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct TableMaterializer {
    db_path: PathBuf,
}

impl TableMaterializer {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// infer_schema → ensure_table → append_rows.
    #[tracing::instrument(level = "info", skip(self, dataset), fields(rows = dataset.row_count()))]
    pub fn materialize(&self, dataset: &Dataset, table_name: &str) -> ImportResult<usize> {
        let mut conn = open_disk_db(&self.db_path)?;
        let schema = infer_schema(dataset, table_name);
        ensure_table(&conn, &schema)?;
        let written = append_rows(&mut conn, table_name, dataset)?;
        info!(table = table_name, rows = written, "rows appended");
        Ok(written)
    }

    /// Read `path` and materialize it into the table named after its stem.
    pub fn materialize_file(&self, path: &Path) -> ImportResult<usize> {
        let table_name = table_name_for(path);
        let raw = process::load_delimited(path)?;
        let dataset = Dataset::from_raw(&raw);
        self.materialize(&dataset, &table_name)
    }
}
