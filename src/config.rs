// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tabload.yaml";

/// Environment variable overriding [`Config::db_path`].
pub const DB_PATH_ENV: &str = "TABLOAD_DB";
/// Environment variable overriding [`Config::data_dir`].
pub const DATA_DIR_ENV: &str = "TABLOAD_DATA_DIR";

/// Paths and limits for one import session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file that receives every imported table.
    pub db_path: PathBuf,
    /// Folder scanned for source files.
    pub data_dir: PathBuf,
    /// File extensions (without the dot) treated as tabular sources.
    pub extensions: Vec<String>,
    /// Number of most recent files taken in automatic mode.
    pub auto_limit: usize,
    /// Number of most recent files offered in manual mode.
    pub manual_pool: usize,
    /// Upper bound on files picked in manual mode.
    pub max_selections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("project.db"),
            data_dir: PathBuf::from("data"),
            extensions: vec!["csv".to_string()],
            auto_limit: 10,
            manual_pool: 50,
            max_selections: 10,
        }
    }
}

impl Config {
    /// Load the session config.
    ///
    /// - `path` given: that YAML file must exist and parse.
    /// - otherwise: `tabload.yaml` is read if present, else defaults.
    ///
    /// `TABLOAD_DB` / `TABLOAD_DATA_DIR` are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Parse a YAML config file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg = Self::from_yaml(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to a map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(db) = env::var(DB_PATH_ENV) {
            debug!(db = %db, "db path overridden from environment");
            self.db_path = PathBuf::from(db);
        }
        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            debug!(dir = %dir, "data dir overridden from environment");
            self.data_dir = PathBuf::from(dir);
        }
    }
}
