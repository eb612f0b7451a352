//! Notecard and quiz question records.
//!
//! # Responsibility
//! - Define the persisted notecard shape and the generated quiz question.
//! - Validate front/back text before it reaches the repository.
//!
//! # Invariants
//! - `QuizQuestion::choices[answer_index]` is the correct answer.
//! - A valid draft has non-blank front and back, and a front of at most
//!   `FRONT_MAX_CHARS` characters.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable non-negative identifier; also the table primary key.
pub type NotecardId = u32;

/// Declared width of the `front` column.
pub const FRONT_MAX_CHARS: usize = 50;

/// Number of choices in every generated quiz question.
pub const QUIZ_CHOICES: usize = 3;

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notecard {
    pub id: NotecardId,
    /// Prompt side, usually a single word.
    pub front: String,
    /// Answer side.
    pub back: String,
}

impl Notecard {
    pub fn new(id: NotecardId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id,
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Multiple-choice question built from three distinct notecards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Front of the prompted notecard.
    pub prompt: String,
    /// Index of the correct entry in `choices`.
    pub answer_index: usize,
    pub choices: [String; QUIZ_CHOICES],
}

impl QuizQuestion {
    /// Returns the correct choice.
    pub fn answer(&self) -> &str {
        &self.choices[self.answer_index]
    }

    /// Returns whether `index` picks the correct choice.
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.answer_index
    }
}

/// Unsaved front/back text from an editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotecardDraft {
    pub front: String,
    pub back: String,
}

impl NotecardDraft {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    /// Checks the draft against editor rules.
    ///
    /// # Errors
    /// - `EmptyFront` / `EmptyBack` when a side is blank after trimming.
    /// - `FrontTooLong` when the front exceeds `FRONT_MAX_CHARS` characters.
    pub fn validate(&self) -> Result<(), DraftValidationError> {
        if self.front.trim().is_empty() {
            return Err(DraftValidationError::EmptyFront);
        }
        if self.back.trim().is_empty() {
            return Err(DraftValidationError::EmptyBack);
        }

        let chars = self.front.chars().count();
        if chars > FRONT_MAX_CHARS {
            return Err(DraftValidationError::FrontTooLong {
                chars,
                max: FRONT_MAX_CHARS,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftValidationError {
    EmptyFront,
    EmptyBack,
    FrontTooLong { chars: usize, max: usize },
}

impl Display for DraftValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFront => write!(f, "notecard front cannot be empty"),
            Self::EmptyBack => write!(f, "notecard back cannot be empty"),
            Self::FrontTooLong { chars, max } => {
                write!(f, "notecard front has {chars} characters; at most {max} allowed")
            }
        }
    }
}

impl Error for DraftValidationError {}

#[cfg(test)]
mod tests {
    use super::{DraftValidationError, NotecardDraft, QuizQuestion, FRONT_MAX_CHARS};

    #[test]
    fn draft_requires_both_sides() {
        assert_eq!(
            NotecardDraft::new("  ", "gato").validate(),
            Err(DraftValidationError::EmptyFront)
        );
        assert_eq!(
            NotecardDraft::new("cat", "\n").validate(),
            Err(DraftValidationError::EmptyBack)
        );
        assert!(NotecardDraft::new("cat", "gato").validate().is_ok());
    }

    #[test]
    fn draft_front_length_counts_chars_not_bytes() {
        let at_limit = "é".repeat(FRONT_MAX_CHARS);
        assert!(NotecardDraft::new(at_limit, "x").validate().is_ok());

        let over = "a".repeat(FRONT_MAX_CHARS + 1);
        assert_eq!(
            NotecardDraft::new(over, "x").validate(),
            Err(DraftValidationError::FrontTooLong {
                chars: FRONT_MAX_CHARS + 1,
                max: FRONT_MAX_CHARS
            })
        );
    }

    #[test]
    fn quiz_question_answer_reads_choice_at_index() {
        let question = QuizQuestion {
            prompt: "dog".to_string(),
            answer_index: 2,
            choices: ["gato".to_string(), "pajaro".to_string(), "perro".to_string()],
        };
        assert_eq!(question.answer(), "perro");
        assert!(question.is_correct(2));
        assert!(!question.is_correct(0));
    }
}
