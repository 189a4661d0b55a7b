//! Progress reporting hooks.
//!
//! The library never draws anything itself. Long waits (scope arming,
//! acquisition) and multi-trace captures report through a [`ProgressCallback`]
//! that the front end implements.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

#[derive(Debug, Clone)]
pub enum ProgressType {
    /// Open-ended wait.
    Spinner,
    Bar { total: u64 },
}

#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub progress_type: ProgressType,
    /// Step label, e.g. `0x03`.
    pub prefix: String,
    pub message: String,
    pub current: Option<u64>,
}

pub trait ProgressCallback: Send + Sync {
    /// Begin a new indicator and return its handle id.
    fn start(&self, info: ProgressInfo) -> ProgressId;

    fn update_message(&self, id: ProgressId, message: String);

    /// Advance a bar. Ignored for spinners.
    fn increment(&self, id: ProgressId, delta: u64);

    fn finish(&self, id: ProgressId, final_message: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

#[derive(Debug, Default)]
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn start(&self, _info: ProgressInfo) -> ProgressId {
        ProgressId(0)
    }

    fn update_message(&self, _id: ProgressId, _message: String) {}

    fn increment(&self, _id: ProgressId, _delta: u64) {}

    fn finish(&self, _id: ProgressId, _final_message: String) {}
}

pub type ProgressCallbackArc = Arc<dyn ProgressCallback>;

pub fn no_op_progress_callback() -> ProgressCallbackArc {
    Arc::new(NoOpProgressCallback)
}

/// Hands out numbered indicators over one callback.
///
/// Clones share the step counter.
#[derive(Clone)]
pub struct ProgressHelper {
    callback: ProgressCallbackArc,
    step_counter: Arc<AtomicI32>,
}

impl ProgressHelper {
    pub fn new(callback: ProgressCallbackArc, initial_step: i32) -> Self {
        Self {
            callback,
            step_counter: Arc::new(AtomicI32::new(initial_step)),
        }
    }

    fn next_step(&self) -> i32 {
        self.step_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn start(&self, progress_type: ProgressType, message: String) -> ProgressHandler {
        let current = match progress_type {
            ProgressType::Spinner => None,
            ProgressType::Bar { .. } => Some(0),
        };
        let info = ProgressInfo {
            progress_type,
            prefix: format!("0x{:02X}", self.next_step()),
            message,
            current,
        };
        let id = self.callback.start(info);
        ProgressHandler {
            callback: Arc::clone(&self.callback),
            id,
        }
    }

    pub fn create_spinner(&self, message: impl Into<String>) -> ProgressHandler {
        self.start(ProgressType::Spinner, message.into())
    }

    pub fn create_bar(&self, total: u64, message: impl Into<String>) -> ProgressHandler {
        self.start(ProgressType::Bar { total }, message.into())
    }

    pub fn current_step(&self) -> i32 {
        self.step_counter.load(Ordering::SeqCst)
    }
}

pub struct ProgressHandler {
    callback: ProgressCallbackArc,
    id: ProgressId,
}

impl ProgressHandler {
    pub fn set_message(&self, message: impl Into<String>) {
        self.callback.update_message(self.id, message.into());
    }

    pub fn inc(&self, delta: u64) {
        self.callback.increment(self.id, delta);
    }

    pub fn finish_with_message(self, message: impl Into<String>) {
        self.callback.finish(self.id, message.into());
    }
}
