pub mod crypto;
pub mod error;
pub mod poll;
pub mod progress;
pub mod rig;
pub mod scope;
pub mod sink;
pub mod target;
pub mod transport;
pub mod utils;

pub use crate::error::{Error, Result};
pub use crate::poll::{CancelToken, PollConfig, Scheduler, SleepScheduler};
pub use crate::rig::{CaptureRig, Trace};
pub use crate::scope::{ScopeSettings, Waveform, WaveformLink};
pub use crate::target::{CipherMode, TargetLink, TargetOptions};
