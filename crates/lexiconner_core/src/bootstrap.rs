//! Per-user paths and one-time process initialization.
//!
//! # Responsibility
//! - Resolve where the notecard database and logs live.
//! - Create the config directory and an empty database file on first run.
//! - Run process-wide setup once, before any storage actor is spawned.
//!
//! # Invariants
//! - The only process-wide state is "has `initialize` run".
//! - Paths are absolute when resolved from `$HOME`.

use crate::logging::init_logging;
use log::info;
use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "Lexiconner";

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// File-system locations used by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub database_file: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolves `$HOME/.config/Lexiconner`.
    ///
    /// Returns `None` when `HOME` is unset or empty.
    pub fn from_home() -> Option<Self> {
        let home = std::env::var_os("HOME").filter(|value| !value.is_empty())?;
        Some(Self::under(PathBuf::from(home).join(".config")))
    }

    /// Lays the application directory out under `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let config_dir = root.as_ref().join(APP_NAME);
        Self {
            database_file: config_dir.join(format!("{APP_NAME}.db")),
            log_dir: config_dir.join("logs"),
            config_dir,
        }
    }

    /// Creates the config directory and an empty database file when absent.
    ///
    /// Existing files are left untouched.
    pub fn ensure_exists(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.database_file)?;
        Ok(())
    }
}

/// One-time process setup. Call once before opening a repository.
///
/// Repeated calls with the same arguments succeed; the logging layer rejects
/// a different level or directory.
pub fn initialize(level: &str, log_dir: impl AsRef<Path>) -> Result<(), String> {
    init_logging(level, log_dir)?;
    if INITIALIZED.set(()).is_ok() {
        info!("event=initialize module=core status=ok app={APP_NAME}");
    }
    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}
