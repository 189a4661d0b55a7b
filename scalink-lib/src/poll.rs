//! Bounded, cancellable status polling.
//!
//! Both protocol engines wait on instrument state by polling. Every poll
//! iteration goes through [`poll_until`], which checks the cancel token and
//! the deadline and then hands control to the [`Scheduler`] for one interval.

use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Yield point called once per poll iteration.
///
/// The default implementation sleeps the calling thread. A host with its own
/// event loop can pump its queue here instead so it stays responsive while a
/// capture waits on the scope.
pub trait Scheduler: Send + Sync {
    fn pause(&self, interval: Duration);
}

#[derive(Debug, Default)]
pub struct SleepScheduler;

impl Scheduler for SleepScheduler {
    fn pause(&self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Cooperative cancellation flag shared between a poll loop and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub deadline: Duration,
    pub cancel: CancelToken,
    pub scheduler: Arc<dyn Scheduler>,
}

impl PollConfig {
    /// Poll every [`DEFAULT_POLL_INTERVAL`], giving up after `deadline`.
    pub fn new(deadline: Duration) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline,
            cancel: CancelToken::new(),
            scheduler: Arc::new(SleepScheduler),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }
}

impl std::fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollConfig")
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Call `attempt` until it returns `Ok(true)`.
///
/// `what` describes the wait for the timeout and cancel errors, e.g.
/// `"waiting for trigger"`. Errors from `attempt` end the loop immediately.
pub fn poll_until<F>(config: &PollConfig, what: &str, mut attempt: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let start = Instant::now();
    let mut polls: u64 = 0;
    loop {
        if config.cancel.is_cancelled() {
            tracing::debug!("{} cancelled after {} polls", what, polls);
            return Err(Error::cancelled(what));
        }
        if attempt()? {
            tracing::debug!("{} done after {} polls", what, polls + 1);
            return Ok(());
        }
        polls += 1;
        if start.elapsed() >= config.deadline {
            tracing::warn!(
                "{} timed out after {:?} ({} polls)",
                what,
                config.deadline,
                polls
            );
            return Err(Error::timeout(what));
        }
        tracing::trace!("{}...", what);
        config.scheduler.pause(config.interval);
    }
}
