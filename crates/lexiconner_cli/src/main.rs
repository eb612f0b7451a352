//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lexiconner_core` linkage and the on-disk store end to end.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `lexiconner_cli [db_path]`. Without an argument the per-user
//! database under `$HOME/.config/Lexiconner` is used and created if needed;
//! with one, logs go to a `logs/` directory beside the database file.

use lexiconner_core::{
    core_version, default_log_level, initialize, AppPaths, NotecardRepository,
    SqliteNotecardRepository,
};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("lexiconner_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    println!("lexiconner_core version={}", core_version());

    let database_file = match std::env::args_os().nth(1) {
        Some(path) => {
            let database_file = PathBuf::from(path);
            initialize(default_log_level(), log_dir_beside(&database_file))?;
            database_file
        }
        None => {
            let paths = AppPaths::from_home().ok_or("HOME is not set")?;
            paths
                .ensure_exists()
                .map_err(|err| format!("cannot prepare `{}`: {err}", paths.config_dir.display()))?;
            initialize(default_log_level(), &paths.log_dir)?;
            paths.database_file
        }
    };
    println!("lexiconner_core database={}", database_file.display());

    let repo = SqliteNotecardRepository::open(&database_file).map_err(|err| err.to_string())?;
    let count = repo.count().map_err(|err| err.to_string())?;
    println!("lexiconner_core notecards={count}");

    repo.close_and_wait().map_err(|err| err.to_string())
}

/// Log directory for an explicit database path: `logs/` next to the file.
fn log_dir_beside(database_file: &Path) -> PathBuf {
    database_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::log_dir_beside;
    use std::path::{Path, PathBuf};

    #[test]
    fn explicit_database_logs_next_to_the_file() {
        assert_eq!(
            log_dir_beside(Path::new("/tmp/cards/Lexiconner.db")),
            PathBuf::from("/tmp/cards/logs")
        );
        assert_eq!(
            log_dir_beside(Path::new("Lexiconner.db")),
            PathBuf::from("./logs")
        );
    }
}
