// src/fetch/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Module for making sure the working folders exist
pub mod folders {
    use super::*;
    use tracing::info;

    /// What [`ensure_folders`] found for one folder.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum FolderStatus {
        Created(PathBuf),
        Existing(PathBuf),
    }

    /// Create every folder in `folders` that does not exist yet (parents included).
    pub fn ensure_folders<P: AsRef<Path>>(folders: &[P]) -> Result<Vec<FolderStatus>> {
        let mut out = Vec::with_capacity(folders.len());
        for folder in folders {
            let folder = folder.as_ref();
            if folder.is_dir() {
                out.push(FolderStatus::Existing(folder.to_path_buf()));
            } else {
                fs::create_dir_all(folder)
                    .with_context(|| format!("creating folder {}", folder.display()))?;
                info!(folder = %folder.display(), "created folder");
                out.push(FolderStatus::Created(folder.to_path_buf()));
            }
        }
        Ok(out)
    }

    /// Folder holding `path`, or `None` when it lives in the working directory.
    pub fn parent_folder(path: &Path) -> Option<&Path> {
        path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Module for listing candidate source files, newest first
pub mod recent {
    use super::*;
    use tracing::debug;

    /// One candidate source file on disk.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SourceFile {
        pub path: PathBuf,
        pub modified: DateTime<Local>,
    }

    impl SourceFile {
        pub fn name(&self) -> String {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }

    /// Files in `dir` whose extension is in `extensions`, most recently
    /// modified first, at most `limit` of them. A missing `dir` yields none.
    pub fn list_recent(dir: &Path, extensions: &[String], limit: usize) -> Result<Vec<SourceFile>> {
        let base = Pattern::escape(&dir.to_string_lossy());
        let mut paths = BTreeSet::new();
        for ext in extensions {
            let pattern = format!("{}/*.{}", base, ext.trim_start_matches('.'));
            for entry in glob(&pattern)
                .with_context(|| format!("invalid glob pattern '{}'", pattern))?
                .filter_map(|e| e.ok())
            {
                if entry.is_file() {
                    paths.insert(entry);
                }
            }
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .with_context(|| format!("reading mtime of {}", path.display()))?;
            files.push(SourceFile {
                path,
                modified: DateTime::<Local>::from(modified),
            });
        }

        // newest first; name breaks ties so the order is stable
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        files.truncate(limit);
        debug!(dir = %dir.display(), found = files.len(), "listed recent files");
        Ok(files)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::Result;
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    /// Write `content` to `dir/name` and backdate its mtime by `age_secs`.
    pub fn write_aged(dir: &Path, name: &str, content: &str, age_secs: u64) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, content)?;
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        File::options().write(true).open(&path)?.set_modified(when)?;
        Ok(path)
    }
}
