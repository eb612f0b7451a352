//! Core domain logic for Lexiconner.
//! Notecard storage, quiz generation and the quiz timer live here; UI layers
//! only call into this crate.

pub mod bootstrap;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use bootstrap::{initialize, is_initialized, AppPaths};
pub use db::{DbError, DbResult, StorageActor};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notecard::{
    DraftValidationError, Notecard, NotecardDraft, NotecardId, QuizQuestion, FRONT_MAX_CHARS,
    QUIZ_CHOICES,
};
pub use repo::notecard_repo::{
    NotecardKey, NotecardRepository, RepoError, RepoResult, SqliteNotecardRepository,
};
pub use scheduler::{RepeatingScheduler, MIN_INTERVAL};
pub use service::notecard_service::{NotecardService, NotecardServiceError};
pub use service::quiz_timer::{preset_interval, QuizTimer, TIMER_PRESET_MINUTES};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
