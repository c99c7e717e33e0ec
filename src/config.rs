//! Runtime configuration resolved from the command line and environment.

use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{PersistenceError, Result};

/// Name of the data directory under `$HOME`.
pub const DATA_DIR_NAME: &str = ".focustwo";
/// Log file the TUI writes to, inside the data directory.
pub const LOG_FILE_NAME: &str = "focustwo.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the slot files.
    pub data_dir: PathBuf,
    /// Number of `-v` flags given.
    pub verbosity: u8,
}

impl Config {
    /// Resolve the data directory and make sure it exists.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        fs::create_dir_all(&data_dir).map_err(|source| PersistenceError::Io {
            op: "create",
            path: data_dir.clone(),
            source,
        })?;
        Ok(Config {
            data_dir,
            verbosity: cli.verbose,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// `$HOME/.focustwo`, or `./.focustwo` when `HOME` is unset.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(DATA_DIR_NAME)
}
