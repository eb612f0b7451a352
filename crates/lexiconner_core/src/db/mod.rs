//! SQLite storage bootstrap and the single-writer storage actor.
//!
//! # Responsibility
//! - Open and configure the SQLite connection used by the notecard store.
//! - Own that connection on one worker thread and serialize every request.
//!
//! # Invariants
//! - Only the actor worker thread touches a connection after `StorageActor::spawn`.
//! - Requests execute in submission (FIFO) order.
//! - One implicit transaction spans the actor lifetime and is committed at close.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod actor;
mod open;

pub use actor::{Request, Response, Row, Rows, StorageActor};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Connection-level failure outside the worker (open, pragmas, commit).
    Sqlite(rusqlite::Error),
    /// A statement failed inside the worker. The worker keeps running.
    ExecutionFault(rusqlite::Error),
    /// The actor was closed, or its worker is gone.
    ConnectionClosed,
    /// The worker thread could not be started.
    WorkerSpawn(std::io::Error),
    /// The worker thread panicked before it could release the connection.
    WorkerPanicked,
}

impl DbError {
    /// Returns the underlying SQLite error code for execution faults.
    pub fn sqlite_code(&self) -> Option<rusqlite::ffi::Error> {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(code, _))
            | Self::ExecutionFault(rusqlite::Error::SqliteFailure(code, _)) => Some(*code),
            _ => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::ExecutionFault(err) => write!(f, "statement execution failed: {err}"),
            Self::ConnectionClosed => write!(f, "storage connection is closed"),
            Self::WorkerSpawn(err) => write!(f, "failed to start storage worker: {err}"),
            Self::WorkerPanicked => write!(f, "storage worker thread panicked"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::ExecutionFault(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::ConnectionClosed | Self::WorkerPanicked => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
