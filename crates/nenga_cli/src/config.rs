//! Runtime configuration resolution.
//!
//! # Invariants
//! - Precedence is flag > environment > platform data directory.
//! - Resolved paths are absolute.

use crate::args::GlobalArgs;
use directories::ProjectDirs;
use nenga_core::{default_log_level, OpenOptions};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "NENGA_DB";
pub const LOG_DIR_ENV: &str = "NENGA_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "NENGA_LOG_LEVEL";

const DB_FILE_NAME: &str = "nenga.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub echo_sql: bool,
}

impl Config {
    /// Resolves configuration from flags, process environment and the
    /// platform data directory.
    pub fn resolve(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let data_dir = ProjectDirs::from("", "", "nenga").map(|dirs| dirs.data_dir().to_path_buf());
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::resolve_with(args, |key| std::env::var(key).ok(), data_dir.as_deref(), &cwd)
    }

    pub fn resolve_with(
        args: &GlobalArgs,
        env: impl Fn(&str) -> Option<String>,
        data_dir: Option<&Path>,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        let env_path = |key: &str| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        let db_path = match args.db.clone().or_else(|| env_path(DB_ENV)) {
            Some(path) => path,
            None => data_dir.ok_or(ConfigError::NoDataDir)?.join(DB_FILE_NAME),
        };
        let log_dir = match args.log_dir.clone().or_else(|| env_path(LOG_DIR_ENV)) {
            Some(path) => path,
            None => data_dir.ok_or(ConfigError::NoDataDir)?.join(LOG_DIR_NAME),
        };
        let log_level = args
            .log_level
            .clone()
            .or_else(|| env(LOG_LEVEL_ENV).filter(|value| !value.trim().is_empty()))
            .unwrap_or_else(|| default_log_level().to_string());

        Ok(Self {
            db_path: absolutize(db_path, cwd),
            log_dir: absolutize(log_dir, cwd),
            log_level,
            echo_sql: !args.nodbecho,
        })
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            echo_sql: self.echo_sql,
        }
    }
}

fn absolutize(path: PathBuf, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// No flag, no environment value and no platform data directory.
    NoDataDir,
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "cannot determine a data directory; pass --db and --log-dir or set {DB_ENV} and {LOG_DIR_ENV}"
            ),
            Self::CurrentDir(err) => write!(f, "cannot read current directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoDataDir => None,
            Self::CurrentDir(err) => Some(err),
        }
    }
}
