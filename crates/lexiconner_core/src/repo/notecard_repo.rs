//! Notecard repository contract and its storage-actor implementation.
//!
//! # Responsibility
//! - Provision the `notecard_table` schema.
//! - Provide notecard CRUD, id allocation and random quiz generation.
//!
//! # Invariants
//! - Every call is expressed as one or more actor requests; the repository
//!   holds no other shared state, so it is safe to share across threads.
//! - `edit` treats an absent or empty side as "keep current value".
//! - `random_question` always yields exactly `QUIZ_CHOICES` choices.

use crate::db::{open_db, open_db_in_memory, DbError, Row, StorageActor};
use crate::model::notecard::{Notecard, NotecardId, QuizQuestion, QUIZ_CHOICES};
use log::debug;
use rand::Rng;
use rusqlite::types::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS notecard_table (
    id    INTEGER  PRIMARY KEY NOT NULL,
    front TEXT(50) NOT NULL,
    back  TEXT     NOT NULL
);";

const NOTECARD_SELECT_SQL: &str = "SELECT id, front, back FROM notecard_table";

pub type RepoResult<T> = Result<T, RepoError>;

/// Key a missing notecard was looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotecardKey {
    Id(NotecardId),
    Front(String),
}

impl Display for NotecardKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Front(front) => write!(f, "front `{front}`"),
        }
    }
}

/// Repository error for notecard persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    NotFound(NotecardKey),
    DuplicateId(NotecardId),
    InsufficientData { required: usize, available: usize },
    /// The repository was closed; the request never reached storage.
    ConnectionClosed,
    InvalidData(String),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "notecard not found: {key}"),
            Self::DuplicateId(id) => write!(f, "notecard id already in use: {id}"),
            Self::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "not enough notecards: {required} required, {available} available"
            ),
            Self::ConnectionClosed => write!(f, "notecard store is closed"),
            Self::InvalidData(message) => write!(f, "invalid persisted notecard data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::ConnectionClosed => Self::ConnectionClosed,
            other => Self::Db(other),
        }
    }
}

/// Repository interface for notecard operations.
pub trait NotecardRepository {
    /// Returns the smallest non-negative id not used by any notecard.
    fn smallest_available_id(&self) -> RepoResult<NotecardId>;
    /// Inserts one notecard. `DuplicateId` when `id` is already in use.
    fn add(&self, id: NotecardId, front: &str, back: &str) -> RepoResult<NotecardId>;
    /// Deletes the notecard with `id`. Absent ids are a no-op.
    fn delete(&self, id: NotecardId) -> RepoResult<()>;
    fn get_by_id(&self, id: NotecardId) -> RepoResult<Notecard>;
    /// Updates front and/or back; absent or empty sides keep their value.
    fn edit(&self, id: NotecardId, front: Option<&str>, back: Option<&str>) -> RepoResult<()>;
    /// Returns the back of a notecard whose front equals `front`.
    fn lookup(&self, front: &str) -> RepoResult<String>;
    fn random_notecard(&self) -> RepoResult<Notecard>;
    /// Builds a three-choice quiz question from random notecards.
    fn random_question(&self) -> RepoResult<QuizQuestion>;
    fn count(&self) -> RepoResult<u64>;
    /// Returns every notecard ordered by id.
    fn list(&self) -> RepoResult<Vec<Notecard>>;
}

/// SQLite-backed notecard store shared by every caller thread.
pub struct SqliteNotecardRepository {
    actor: StorageActor,
}

impl SqliteNotecardRepository {
    /// Opens (or creates) the database file and provisions the schema.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let actor = StorageActor::spawn(open_db(path)?)?;
        Self::from_actor(actor)
    }

    /// Opens a private in-memory store; contents vanish on close.
    pub fn open_in_memory() -> RepoResult<Self> {
        let actor = StorageActor::spawn(open_db_in_memory()?)?;
        Self::from_actor(actor)
    }

    /// Wraps an already running actor and provisions the schema.
    pub fn from_actor(actor: StorageActor) -> RepoResult<Self> {
        let repo = Self { actor };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// Creates `notecard_table` when absent. Safe on every startup.
    pub fn ensure_schema(&self) -> RepoResult<()> {
        self.actor.execute(CREATE_TABLE_SQL, Vec::new(), None)?;
        Ok(())
    }

    /// Builds a three-choice quiz question, placing the answer with `rng`.
    ///
    /// Three distinct notecards are drawn by SQLite. The first gives the
    /// prompt and the correct answer; the backs of the other two are
    /// distractors. Choice texts are not deduplicated.
    ///
    /// # Errors
    /// - `InsufficientData` when fewer than three notecards exist.
    pub fn random_question_with<R: Rng>(&self, rng: &mut R) -> RepoResult<QuizQuestion> {
        let drawn = self
            .actor
            .select(
                format!("{NOTECARD_SELECT_SQL} ORDER BY RANDOM() LIMIT {QUIZ_CHOICES};"),
                Vec::new(),
            )?
            .map(|row| parse_notecard_row(row?))
            .collect::<RepoResult<Vec<_>>>()?;

        let available = drawn.len();
        let [prompt_card, first_distractor, second_distractor]: [Notecard; QUIZ_CHOICES] =
            drawn.try_into().map_err(|_| RepoError::InsufficientData {
                required: QUIZ_CHOICES,
                available,
            })?;

        let mut choices = vec![first_distractor.back, second_distractor.back];
        let answer_index = rng.random_range(0..=choices.len());
        choices.insert(answer_index, prompt_card.back);

        let choices: [String; QUIZ_CHOICES] = choices.try_into().map_err(|_| {
            RepoError::InvalidData("quiz choices lost during assembly".to_string())
        })?;

        debug!(
            "event=quiz_generate module=repo status=ok id={} answer_index={}",
            prompt_card.id, answer_index
        );
        Ok(QuizQuestion {
            prompt: prompt_card.front,
            answer_index,
            choices,
        })
    }

    /// Queues the storage shutdown. Pending writes are committed by the worker.
    ///
    /// Every later call on this repository fails with `ConnectionClosed`.
    pub fn close(&self) -> RepoResult<()> {
        self.actor.close()?;
        Ok(())
    }

    /// Closes (when still open) and waits until the data is committed.
    pub fn close_and_wait(&self) -> RepoResult<()> {
        self.actor.join()?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.actor.is_closed()
    }

    /// Underlying actor, for callers that need raw statements.
    pub fn storage(&self) -> &StorageActor {
        &self.actor
    }
}

impl NotecardRepository for SqliteNotecardRepository {
    /// Linear in the number of notecards.
    fn smallest_available_id(&self) -> RepoResult<NotecardId> {
        let mut taken = HashSet::new();
        for row in self
            .actor
            .select("SELECT id FROM notecard_table;", Vec::new())?
        {
            let mut columns = row?.into_iter();
            taken.insert(expect_id(columns.next())?);
        }

        let mut candidate: NotecardId = 0;
        while taken.contains(&candidate) {
            candidate = candidate.checked_add(1).ok_or_else(|| {
                RepoError::InvalidData("notecard id space exhausted".to_string())
            })?;
        }
        Ok(candidate)
    }

    /// Waits until storage has accepted the insert.
    fn add(&self, id: NotecardId, front: &str, back: &str) -> RepoResult<NotecardId> {
        let result = self.actor.execute_and_wait(
            "INSERT INTO notecard_table (id, front, back) VALUES (?1, ?2, ?3);",
            vec![id_value(id), text_value(front), text_value(back)],
        );

        match result {
            Ok(()) => {
                debug!("event=notecard_add module=repo status=ok id={id}");
                Ok(id)
            }
            Err(err) if is_primary_key_violation(&err) => {
                debug!("event=notecard_add module=repo status=error id={id} error_code=duplicate_id");
                Err(RepoError::DuplicateId(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, id: NotecardId) -> RepoResult<()> {
        self.actor.execute(
            "DELETE FROM notecard_table WHERE id = ?1;",
            vec![id_value(id)],
            None,
        )?;
        debug!("event=notecard_delete module=repo status=queued id={id}");
        Ok(())
    }

    /// # Errors
    /// - `NotFound` when no row has this id.
    fn get_by_id(&self, id: NotecardId) -> RepoResult<Notecard> {
        let mut rows = self.actor.select(
            format!("{NOTECARD_SELECT_SQL} WHERE id = ?1;"),
            vec![id_value(id)],
        )?;

        match rows.next().transpose()? {
            Some(row) => parse_notecard_row(row),
            None => Err(RepoError::NotFound(NotecardKey::Id(id))),
        }
    }

    /// `None` and `Some("")` both mean "keep the current value"; an empty
    /// string cannot be written through this call. With both sides unset the
    /// call only checks that the notecard exists.
    ///
    /// # Errors
    /// - `NotFound` when no row has this id.
    fn edit(&self, id: NotecardId, front: Option<&str>, back: Option<&str>) -> RepoResult<()> {
        let current = self.get_by_id(id)?;

        let front = front.filter(|value| !value.is_empty());
        let back = back.filter(|value| !value.is_empty());
        if front.is_none() && back.is_none() {
            debug!("event=notecard_edit module=repo status=skipped id={id}");
            return Ok(());
        }

        let front = front.unwrap_or(current.front.as_str());
        let back = back.unwrap_or(current.back.as_str());
        self.actor.execute(
            "UPDATE notecard_table SET front = ?1, back = ?2 WHERE id = ?3;",
            vec![text_value(front), text_value(back), id_value(id)],
            None,
        )?;
        debug!("event=notecard_edit module=repo status=queued id={id}");
        Ok(())
    }

    /// When several notecards share a front, which one wins is up to SQLite.
    ///
    /// # Errors
    /// - `NotFound` when no front matches.
    fn lookup(&self, front: &str) -> RepoResult<String> {
        let mut rows = self.actor.select(
            "SELECT back FROM notecard_table WHERE front = ?1;",
            vec![text_value(front)],
        )?;

        match rows.next().transpose()? {
            Some(row) => expect_text(row.into_iter().next(), "back"),
            None => Err(RepoError::NotFound(NotecardKey::Front(front.to_string()))),
        }
    }

    /// Returns one notecard chosen uniformly at random.
    ///
    /// # Errors
    /// - `InsufficientData` when the store is empty.
    fn random_notecard(&self) -> RepoResult<Notecard> {
        let mut rows = self.actor.select(
            format!("{NOTECARD_SELECT_SQL} ORDER BY RANDOM() LIMIT 1;"),
            Vec::new(),
        )?;

        match rows.next().transpose()? {
            Some(row) => parse_notecard_row(row),
            None => Err(RepoError::InsufficientData {
                required: 1,
                available: 0,
            }),
        }
    }

    fn random_question(&self) -> RepoResult<QuizQuestion> {
        self.random_question_with(&mut rand::rng())
    }

    fn count(&self) -> RepoResult<u64> {
        let mut rows = self
            .actor
            .select("SELECT COUNT(*) FROM notecard_table;", Vec::new())?;

        match rows.next().transpose()?.and_then(|row| row.into_iter().next()) {
            Some(Value::Integer(count)) => u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`"))),
            other => Err(RepoError::InvalidData(format!(
                "unexpected COUNT(*) result `{other:?}`"
            ))),
        }
    }

    fn list(&self) -> RepoResult<Vec<Notecard>> {
        self.actor
            .select(format!("{NOTECARD_SELECT_SQL} ORDER BY id ASC;"), Vec::new())?
            .map(|row| parse_notecard_row(row?))
            .collect()
    }
}

fn parse_notecard_row(row: Row) -> RepoResult<Notecard> {
    let mut columns = row.into_iter();
    Ok(Notecard {
        id: expect_id(columns.next())?,
        front: expect_text(columns.next(), "front")?,
        back: expect_text(columns.next(), "back")?,
    })
}

fn expect_id(value: Option<Value>) -> RepoResult<NotecardId> {
    match value {
        Some(Value::Integer(raw)) => NotecardId::try_from(raw).map_err(|_| {
            RepoError::InvalidData(format!("id `{raw}` in notecard_table.id is out of range"))
        }),
        other => Err(RepoError::InvalidData(format!(
            "expected integer in notecard_table.id, got `{other:?}`"
        ))),
    }
}

fn expect_text(value: Option<Value>, column: &str) -> RepoResult<String> {
    match value {
        Some(Value::Text(text)) => Ok(text),
        other => Err(RepoError::InvalidData(format!(
            "expected text in notecard_table.{column}, got `{other:?}`"
        ))),
    }
}

fn id_value(id: NotecardId) -> Value {
    Value::Integer(i64::from(id))
}

fn text_value(text: &str) -> Value {
    Value::Text(text.to_string())
}

fn is_primary_key_violation(err: &DbError) -> bool {
    matches!(
        err.sqlite_code(),
        Some(code) if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
