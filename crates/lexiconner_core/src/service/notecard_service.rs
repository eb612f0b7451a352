//! Notecard use-case service for editing surfaces.
//!
//! # Responsibility
//! - Validate drafts before they reach storage.
//! - Allocate ids for new notecards, recovering from allocation races.
//! - Offer batch delete and quiz pass-throughs for UI callers.
//!
//! # Invariants
//! - Only drafts passing `NotecardDraft::validate` are persisted.
//! - A new notecard always gets the smallest id free at insert time.

use crate::model::notecard::{
    DraftValidationError, Notecard, NotecardDraft, NotecardId, QuizQuestion,
};
use crate::repo::notecard_repo::{NotecardRepository, RepoError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const ID_ALLOCATION_ATTEMPTS: usize = 32;

/// Service error for notecard use-cases.
#[derive(Debug)]
pub enum NotecardServiceError {
    /// Draft rejected before touching storage.
    InvalidDraft(DraftValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Every allocated id was taken by a concurrent caller before insert.
    IdAllocationExhausted { attempts: usize },
}

impl Display for NotecardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDraft(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::IdAllocationExhausted { attempts } => {
                write!(f, "could not allocate a notecard id after {attempts} attempts")
            }
        }
    }
}

impl Error for NotecardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDraft(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::IdAllocationExhausted { .. } => None,
        }
    }
}

impl From<DraftValidationError> for NotecardServiceError {
    fn from(value: DraftValidationError) -> Self {
        Self::InvalidDraft(value)
    }
}

impl From<RepoError> for NotecardServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Notecard service facade over a shared repository implementation.
pub struct NotecardService<R: NotecardRepository> {
    repo: Arc<R>,
}

impl<R: NotecardRepository> NotecardService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Validates `draft` and stores it under the smallest free id.
    ///
    /// Another caller may claim the allocated id before the insert lands; the
    /// id is then re-allocated, a bounded number of times.
    pub fn create_notecard(
        &self,
        draft: &NotecardDraft,
    ) -> Result<Notecard, NotecardServiceError> {
        draft.validate()?;

        for attempt in 1..=ID_ALLOCATION_ATTEMPTS {
            let id = self.repo.smallest_available_id()?;
            match self.repo.add(id, &draft.front, &draft.back) {
                Ok(id) => {
                    debug!("event=notecard_create module=service status=ok id={id} attempt={attempt}");
                    return Ok(Notecard::new(id, draft.front.as_str(), draft.back.as_str()));
                }
                Err(RepoError::DuplicateId(taken)) => {
                    warn!(
                        "event=notecard_create module=service status=retry id={taken} attempt={attempt}"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(NotecardServiceError::IdAllocationExhausted {
            attempts: ID_ALLOCATION_ATTEMPTS,
        })
    }

    /// Validates `draft` and replaces both sides of notecard `id`.
    pub fn update_notecard(
        &self,
        id: NotecardId,
        draft: &NotecardDraft,
    ) -> Result<Notecard, NotecardServiceError> {
        draft.validate()?;
        self.repo
            .edit(id, Some(draft.front.as_str()), Some(draft.back.as_str()))?;
        Ok(Notecard::new(id, draft.front.as_str(), draft.back.as_str()))
    }

    /// Deletes every id in order. Returns how many deletes were queued.
    pub fn delete_notecards(&self, ids: &[NotecardId]) -> Result<usize, NotecardServiceError> {
        for id in ids {
            self.repo.delete(*id)?;
        }
        Ok(ids.len())
    }

    pub fn list_notecards(&self) -> Result<Vec<Notecard>, NotecardServiceError> {
        Ok(self.repo.list()?)
    }

    pub fn next_question(&self) -> Result<QuizQuestion, NotecardServiceError> {
        Ok(self.repo.random_question()?)
    }
}
