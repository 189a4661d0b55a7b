//! Scope plus target, one trace at a time.

use crate::scope::WaveformLink;
use crate::target::TargetLink;
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard};

/// One captured trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub key: Vec<u8>,
    pub text_in: Vec<u8>,
    /// Target output, `None` when the reply was unusable.
    pub text_out: Option<Vec<u8>>,
    /// Locally computed reference result.
    pub expected: Option<Vec<u8>>,
    pub samples: Vec<i16>,
}

impl Trace {
    /// True when the target answered and agreed with the reference.
    pub fn verified(&self) -> bool {
        matches!((&self.text_out, &self.expected), (Some(out), Some(exp)) if out == exp)
    }
}

pub struct Links {
    pub scope: WaveformLink,
    pub target: TargetLink,
}

pub struct CaptureRig {
    links: Mutex<Links>,
}

impl CaptureRig {
    pub fn new(scope: WaveformLink, target: TargetLink) -> Self {
        Self {
            links: Mutex::new(Links { scope, target }),
        }
    }

    /// Exclusive access to both links, for setup between traces.
    pub fn lock(&self) -> Result<MutexGuard<'_, Links>> {
        self.links
            .lock()
            .map_err(|_| Error::invalid_input("capture session poisoned by an earlier panic"))
    }

    /// Load key and input, arm the scope, run the target and collect both sides.
    pub fn capture_trace(&self, key: &[u8], text: &[u8]) -> Result<Trace> {
        let mut links = self.lock()?;
        let Links { scope, target } = &mut *links;

        target.load_key(key);
        target.load_input(text);
        scope.arm()?;
        target.go()?;
        let waveform = match scope.capture_waveform() {
            Ok(waveform) => waveform,
            Err(e) => {
                if let Err(release) = target.release_trigger() {
                    tracing::warn!("failed to release trigger line: {}", release);
                }
                return Err(e);
            }
        };
        let text_out = target.read_response()?;

        let session = target.session();
        let trace = Trace {
            key: session.key.clone().unwrap_or_default(),
            text_in: session.input.clone().unwrap_or_default(),
            text_out,
            expected: target.expected(),
            samples: waveform.samples,
        };
        tracing::debug!(
            "trace captured: {} samples, verified: {}",
            trace.samples.len(),
            trace.verified()
        );
        Ok(trace)
    }

    pub fn into_links(self) -> Result<Links> {
        self.links
            .into_inner()
            .map_err(|_| Error::invalid_input("capture session poisoned by an earlier panic"))
    }
}
