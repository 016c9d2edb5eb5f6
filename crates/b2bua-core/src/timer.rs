//! Deadline scheduling for call-leg and relay timers.
//!
//! A [`Scheduler`] runs a one-shot task after a relative delay or at an
//! absolute deadline and hands back a [`TimerHandle`]. Cancelling a handle is
//! idempotent: it is safe after the timer fired, after a previous cancel, or
//! from inside the task itself. Dropping a handle leaves the timer running.
//!
//! Deadlines are [`tokio::time::Instant`] values and follow the runtime
//! clock, including a paused test clock.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

/// Work executed when a timer fires
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Source of one-shot timers
pub trait Scheduler: Send + Sync {
    /// Run `task` once `deadline` has passed
    fn schedule_at(&self, deadline: Instant, task: TimerTask) -> TimerHandle;

    /// Run `task` after `delay`
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        self.schedule_at(Instant::now() + delay, task)
    }
}

/// Cancellation handle for a scheduled timer
#[derive(Clone)]
pub struct TimerHandle {
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    /// Handle not backed by a runtime task; the owning scheduler checks
    /// [`TimerHandle::is_cancelled`] before running the task.
    pub fn detached(deadline: Instant) -> Self {
        Self {
            deadline,
            cancelled: Arc::new(AtomicBool::new(false)),
            abort: None,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            trace!("Timer cancelled");
        }
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// [`Scheduler`] backed by tokio tasks. Must be used from within a runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_at(&self, deadline: Instant, task: TimerTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !flag.load(Ordering::Acquire) {
                task();
            }
        });
        TimerHandle {
            deadline,
            cancelled,
            abort: Some(join.abort_handle()),
        }
    }
}
