//! Periodic quiz prompts driven by a repeating scheduler.
//!
//! # Responsibility
//! - Keep at most one active quiz timer.
//! - Generate a question from the shared repository on every tick.
//!
//! # Invariants
//! - Setting a new interval stops the previous timer first.
//! - Ticks that cannot produce a question are logged and skipped.

use crate::model::notecard::QuizQuestion;
use crate::repo::notecard_repo::{NotecardRepository, RepoError};
use crate::scheduler::RepeatingScheduler;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

/// Timer choices offered by the tray menu, in minutes.
pub const TIMER_PRESET_MINUTES: [u64; 6] = [5, 10, 15, 30, 45, 60];

/// Returns the interval for a menu preset, or `None` for unknown values.
pub fn preset_interval(minutes: u64) -> Option<Duration> {
    TIMER_PRESET_MINUTES
        .contains(&minutes)
        .then(|| Duration::from_secs(minutes * 60))
}

/// Owner of the single active quiz timer.
pub struct QuizTimer<R> {
    repo: Arc<R>,
    active: Option<RepeatingScheduler>,
}

impl<R> QuizTimer<R>
where
    R: NotecardRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo, active: None }
    }

    /// Replaces the active timer with one firing every `interval`.
    ///
    /// `on_question` runs on the tick thread.
    pub fn set_interval<F>(&mut self, interval: Duration, on_question: F)
    where
        F: Fn(QuizQuestion) + Send + Sync + 'static,
    {
        self.clear();

        let repo = Arc::clone(&self.repo);
        self.active = Some(RepeatingScheduler::spawn(interval, move || {
            deliver_question(repo.as_ref(), &on_question);
        }));
        info!(
            "event=quiz_timer_set module=service status=ok interval_secs={}",
            interval.as_secs()
        );
    }

    /// Stops the active timer, if any.
    pub fn clear(&mut self) {
        if let Some(scheduler) = self.active.take() {
            scheduler.stop();
            info!("event=quiz_timer_clear module=service status=ok");
        }
    }

    pub fn active_interval(&self) -> Option<Duration> {
        self.active.as_ref().map(RepeatingScheduler::interval)
    }
}

fn deliver_question(repo: &impl NotecardRepository, on_question: &dyn Fn(QuizQuestion)) {
    match repo.random_question() {
        Ok(question) => on_question(question),
        Err(RepoError::InsufficientData {
            required,
            available,
        }) => info!(
            "event=quiz_tick module=service status=skipped reason=insufficient_data required={required} available={available}"
        ),
        Err(RepoError::ConnectionClosed) => {
            info!("event=quiz_tick module=service status=skipped reason=closed")
        }
        Err(err) => error!("event=quiz_tick module=service status=error error={err}"),
    }
}
