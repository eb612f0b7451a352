//! Self-rescheduling interval timer.
//!
//! # Responsibility
//! - Run a callback every `interval` until stopped.
//!
//! # Invariants
//! - `start` while already scheduled is a no-op.
//! - On each fire the next timer is armed before the callback runs, so the
//!   effective period drifts by callback latency. This is not compensated.
//! - `stop` cancels the pending timer; a callback already running finishes.
//! - Each tick runs on a freshly spawned thread.
//! - The interval is at least `MIN_INTERVAL`; an interval past the clock's
//!   range never fires and waits for `stop`.

use log::{debug, error};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const TIMER_THREAD_NAME: &str = "lexiconner-timer";

/// Shortest accepted interval; smaller values are clamped up to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Repeating timer handle. Dropping it stops the timer.
pub struct RepeatingScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    interval: Duration,
    callback: Box<dyn Fn() + Send + Sync>,
    state: Mutex<TimerState>,
    wake: Condvar,
}

#[derive(Debug, Default)]
struct TimerState {
    running: bool,
    /// Bumped on every start/stop; timers armed for an older value exit.
    generation: u64,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RepeatingScheduler {
    /// Creates a stopped scheduler. `interval` is clamped to `MIN_INTERVAL`.
    pub fn new<F>(interval: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                interval: interval.max(MIN_INTERVAL),
                callback: Box::new(callback),
                state: Mutex::new(TimerState::default()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Creates a scheduler and starts it right away.
    pub fn spawn<F>(interval: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let scheduler = Self::new(interval, callback);
        scheduler.start();
        scheduler
    }

    /// Arms the timer. No-op when already scheduled.
    pub fn start(&self) {
        let generation = {
            let mut state = self.shared.lock_state();
            if state.running {
                return;
            }
            state.running = true;
            state.generation += 1;
            state.generation
        };

        debug!(
            "event=scheduler_start module=scheduler status=ok interval_ms={}",
            self.shared.interval.as_millis()
        );
        arm_timer(Arc::clone(&self.shared), generation);
    }

    /// Cancels the pending timer. A callback already in flight is not interrupted.
    pub fn stop(&self) {
        {
            let mut state = self.shared.lock_state();
            if !state.running {
                return;
            }
            state.running = false;
            state.generation += 1;
        }
        self.shared.wake.notify_all();
        debug!("event=scheduler_stop module=scheduler status=ok");
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock_state().running
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }
}

impl Drop for RepeatingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn arm_timer(shared: Arc<Shared>, generation: u64) {
    let timer_shared = Arc::clone(&shared);
    let spawned = thread::Builder::new()
        .name(TIMER_THREAD_NAME.to_string())
        .spawn(move || {
            if !wait_for_deadline(&timer_shared, generation) {
                return;
            }

            arm_timer(Arc::clone(&timer_shared), generation);
            debug!("event=scheduler_tick module=scheduler status=fire");
            (timer_shared.callback)();
        });

    if let Err(err) = spawned {
        error!("event=scheduler_arm module=scheduler status=error error={err}");
        let mut state = shared.lock_state();
        if state.generation == generation {
            state.running = false;
        }
    }
}

/// Sleeps until the interval elapses. Returns `false` when the timer was
/// cancelled or superseded in the meantime.
fn wait_for_deadline(shared: &Shared, generation: u64) -> bool {
    let deadline = Instant::now().checked_add(shared.interval);
    let mut state = shared.lock_state();
    loop {
        if !state.running || state.generation != generation {
            return false;
        }

        state = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return true;
                }
                match shared.wake.wait_timeout(state, deadline - now) {
                    Ok((guard, _)) => guard,
                    Err(poisoned) => poisoned.into_inner().0,
                }
            }
            // Unreachable deadline: only a stop or restart wakes this timer.
            None => shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner),
        };
    }
}
