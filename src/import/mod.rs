// src/import/mod.rs
use anyhow::{Context, Result};
use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::duck::{self, TableMaterializer};
use crate::error::ImportResult;
use crate::fetch::{
    folders::{ensure_folders, parent_folder, FolderStatus},
    recent::{list_recent, SourceFile},
};
use crate::process::utils::table_name_for;
use crate::select::prompt_for_selection;

/// How the operator wants files picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Take the newest `auto_limit` files.
    Automatic,
    /// Let the operator pick from the newest `manual_pool` files.
    Manual,
}

impl ImportMode {
    /// `a` / `m`, case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "a" => Some(ImportMode::Automatic),
            "m" => Some(ImportMode::Manual),
            _ => None,
        }
    }
}

/// Result of importing one source file.
#[derive(Debug)]
pub struct ImportOutcome {
    pub path: PathBuf,
    pub table: String,
    pub result: ImportResult<usize>,
}

/// Per-file outcomes of one run, in the order files were attempted.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn rows_imported(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(ImportReport),
    /// The mode entry was neither `a` nor `m`; nothing was imported.
    InvalidMode(String),
}

/// Import `path` and print one progress line for it.
pub fn import_one<W: Write>(
    materializer: &TableMaterializer,
    path: &Path,
    out: &mut W,
) -> io::Result<ImportOutcome> {
    let table = table_name_for(path);
    let result = materializer.materialize_file(path);

    match &result {
        Ok(rows) => {
            info!(path = %path.display(), table = %table, rows, "imported");
            writeln!(
                out,
                "Data from {} inserted successfully into {}.",
                path.display(),
                table
            )?;
        }
        Err(e) => {
            error!(path = %path.display(), kind = e.kind(), "import failed: {}", e);
            writeln!(out, "Error inserting data from {}: {}", path.display(), e)?;
        }
    }

    Ok(ImportOutcome {
        path: path.to_path_buf(),
        table,
        result,
    })
}

/// Import each file in turn. A failing file never stops the others.
pub fn import_files<W: Write>(
    materializer: &TableMaterializer,
    files: &[SourceFile],
    out: &mut W,
) -> io::Result<ImportReport> {
    let mut report = ImportReport::default();
    for file in files {
        report.outcomes.push(import_one(materializer, &file.path, out)?);
    }
    Ok(report)
}

/// The whole interactive session: folders, database, mode prompt, imports.
#[tracing::instrument(level = "info", skip_all, fields(db = %config.db_path.display()))]
pub fn run<R: BufRead, W: Write>(config: &Config, input: &mut R, out: &mut W) -> Result<RunOutcome> {
    // ─── 1) folders ──────────────────────────────────────────────────
    let mut folders = vec![config.data_dir.clone()];
    if let Some(db_dir) = parent_folder(&config.db_path) {
        folders.push(db_dir.to_path_buf());
    }
    for status in ensure_folders(&folders)? {
        match status {
            FolderStatus::Created(p) => writeln!(out, "Creating folder: {}", p.display())?,
            FolderStatus::Existing(p) => writeln!(out, "Folder already exists: {}", p.display())?,
        }
    }

    // ─── 2) database file ────────────────────────────────────────────
    match duck::create_database(&config.db_path) {
        Ok(()) => writeln!(out, "Database created successfully.")?,
        Err(e) => {
            // imports below will report their own storage errors
            error!("database bootstrap failed: {}", e);
            writeln!(out, "Error creating the database: {}", e)?;
        }
    }

    // ─── 3) mode ─────────────────────────────────────────────────────
    write!(out, "Enter 'a' for automatic import or 'm' for manual import: ")?;
    out.flush()?;
    let mut choice = String::new();
    input.read_line(&mut choice).context("reading import mode")?;

    let mode = match ImportMode::parse(&choice) {
        Some(m) => m,
        None => {
            warn!(choice = %choice.trim(), "unrecognised import mode");
            writeln!(
                out,
                "Invalid option selected. Please run the script again and choose 'a' or 'm'."
            )?;
            return Ok(RunOutcome::InvalidMode(choice.trim().to_string()));
        }
    };
    info!(?mode, "import mode");

    // ─── 4) pick files ───────────────────────────────────────────────
    let files = match mode {
        ImportMode::Automatic => {
            let files = list_recent(&config.data_dir, &config.extensions, config.auto_limit)?;
            if !files.is_empty() {
                writeln!(out, "Automatically importing the following files:")?;
                for f in &files {
                    writeln!(out, "  - {}", f.name())?;
                }
            }
            files
        }
        ImportMode::Manual => {
            let pool = list_recent(&config.data_dir, &config.extensions, config.manual_pool)?;
            if pool.is_empty() {
                pool
            } else {
                prompt_for_selection(&pool, config.max_selections, input, out)
                    .context("reading file selection")?
            }
        }
    };
    if files.is_empty() {
        writeln!(out, "No files to import in {}.", config.data_dir.display())?;
    }

    // ─── 5) import ───────────────────────────────────────────────────
    let materializer = TableMaterializer::new(&config.db_path);
    let report = import_files(&materializer, &files, out)?;
    writeln!(
        out,
        "Imported {} rows from {} of {} files.",
        report.rows_imported(),
        report.succeeded(),
        report.attempted()
    )?;
    info!(
        attempted = report.attempted(),
        failed = report.failed(),
        rows = report.rows_imported(),
        "run complete"
    );
    Ok(RunOutcome::Completed(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use crate::fetch::test_support::write_aged;
    use std::io::Cursor;

    struct Session {
        _root: tempfile::TempDir,
        config: Config,
    }

    fn session() -> Result<Session> {
        let root = tempfile::tempdir()?;
        let config = Config {
            db_path: root.path().join("db").join("project.db"),
            data_dir: root.path().join("data"),
            ..Config::default()
        };
        Ok(Session {
            _root: root,
            config,
        })
    }

    fn drive(config: &Config, typed: &str) -> Result<(RunOutcome, String)> {
        let mut input = Cursor::new(typed.as_bytes().to_vec());
        let mut out = Vec::new();
        let outcome = run(config, &mut input, &mut out)?;
        Ok((outcome, String::from_utf8(out)?))
    }

    fn tables(config: &Config) -> Result<Vec<String>> {
        let conn = duck::open_disk_db(&config.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn completed(outcome: RunOutcome) -> ImportReport {
        match outcome {
            RunOutcome::Completed(r) => r,
            other => panic!("expected a completed run, got {other:?}"),
        }
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(ImportMode::parse("a\n"), Some(ImportMode::Automatic));
        assert_eq!(ImportMode::parse(" M "), Some(ImportMode::Manual));
        assert_eq!(ImportMode::parse("x"), None);
        assert_eq!(ImportMode::parse(""), None);
    }

    #[test]
    fn invalid_mode_imports_nothing() -> Result<()> {
        let s = session()?;
        std::fs::create_dir_all(&s.config.data_dir)?;
        write_aged(&s.config.data_dir, "sales.csv", "qty\n1\n", 10)?;

        let (outcome, shown) = drive(&s.config, "x\n")?;

        assert!(matches!(outcome, RunOutcome::InvalidMode(ref m) if m == "x"));
        assert!(shown.contains("Invalid option selected"));
        assert!(!shown.contains("Automatically importing"));
        assert!(tables(&s.config)?.is_empty());
        Ok(())
    }

    #[test]
    fn bootstrap_creates_folders_and_database() -> Result<()> {
        let s = session()?;
        let (_, shown) = drive(&s.config, "a\n")?;

        assert!(s.config.data_dir.is_dir());
        assert!(s.config.db_path.exists());
        assert!(shown.contains(&format!("Creating folder: {}", s.config.data_dir.display())));
        assert!(shown.contains("Database created successfully."));
        assert!(shown.contains("No files to import"));

        let (_, again) = drive(&s.config, "a\n")?;
        assert!(again.contains(&format!("Folder already exists: {}", s.config.data_dir.display())));
        Ok(())
    }

    #[test]
    fn manual_mode_imports_only_the_chosen_file() -> Result<()> {
        let s = session()?;
        std::fs::create_dir_all(&s.config.data_dir)?;
        for (i, name) in ["f1", "f2", "f3", "f4", "f5"].iter().enumerate() {
            // f1 newest, f5 oldest
            write_aged(
                &s.config.data_dir,
                &format!("{}.csv", name),
                "qty,note\n1,a\n2,b\n",
                10 + 60 * i as u64,
            )?;
        }

        let (outcome, shown) = drive(&s.config, "m\n2\n\n")?;
        let report = completed(outcome);

        assert!(shown.contains("5: f5.csv"));
        assert_eq!(report.attempted(), 1);
        assert_eq!(report.outcomes[0].table, "f2");
        assert_eq!(report.rows_imported(), 2);
        assert_eq!(tables(&s.config)?, vec!["f2"]);
        Ok(())
    }

    #[test]
    fn automatic_mode_takes_newest_files() -> Result<()> {
        let mut s = session()?;
        s.config.auto_limit = 2;
        std::fs::create_dir_all(&s.config.data_dir)?;
        write_aged(&s.config.data_dir, "old.csv", "v\n1\n", 500)?;
        write_aged(&s.config.data_dir, "mid.csv", "v\n1\n", 200)?;
        write_aged(&s.config.data_dir, "new.csv", "v\n1\n2\n", 20)?;

        let (outcome, shown) = drive(&s.config, "a\n")?;
        let report = completed(outcome);

        assert!(shown.contains("Automatically importing the following files:\n  - new.csv\n  - mid.csv\n"));
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.rows_imported(), 3);
        assert_eq!(tables(&s.config)?, vec!["mid", "new"]);
        Ok(())
    }

    #[test]
    fn failing_file_does_not_stop_the_batch() -> Result<()> {
        let s = session()?;
        std::fs::create_dir_all(&s.config.data_dir)?;
        write_aged(&s.config.data_dir, "good.csv", "qty\n1\n2\n", 300)?;
        write_aged(&s.config.data_dir, "empty.csv", "", 200)?;
        write_aged(&s.config.data_dir, "headers.csv", "qty\n", 100)?;

        let (outcome, shown) = drive(&s.config, "a\n")?;
        let report = completed(outcome);

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert!(report
            .outcomes
            .iter()
            .filter(|o| o.table != "good")
            .all(|o| matches!(o.result, Err(ImportError::EmptyData { .. }))));
        assert!(shown.contains("Error inserting data from"));
        assert!(shown.contains("Imported 2 rows from 1 of 3 files."));
        Ok(())
    }

    #[test]
    fn reimport_with_incompatible_column_is_reported() -> Result<()> {
        let s = session()?;
        std::fs::create_dir_all(&s.config.data_dir)?;
        let path = write_aged(&s.config.data_dir, "sales.csv", "qty\n1\n2\n", 50)?;

        completed(drive(&s.config, "a\n")?.0);
        std::fs::write(&path, "qty\nmany\n")?;
        let report = completed(drive(&s.config, "a\n")?.0);

        assert!(matches!(
            report.outcomes[0].result,
            Err(ImportError::SchemaMismatch { .. })
        ));
        let conn = duck::open_disk_db(&s.config.db_path)?;
        assert_eq!(duck::count_rows(&conn, "sales")?, 2);
        Ok(())
    }
}
