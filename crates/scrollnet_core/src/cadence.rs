//! crates/scrollnet_core/src/cadence.rs
//!
//! Counts consumed videos per identity and signals when a feedback form is due.

use std::collections::HashMap;
use std::num::NonZeroU32;
use tracing::debug;

use crate::domain::Identity;

/// Videos between two feedback prompts unless configured otherwise.
pub const DEFAULT_CADENCE: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CadenceSignal {
    pub feedback_required: bool,
    /// The N-th video of the window that just closed.
    pub video_id_for_feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CadenceTracker {
    cadence: NonZeroU32,
    windows: HashMap<Identity, u32>,
}

impl Default for CadenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}

impl CadenceTracker {
    pub fn new(cadence: NonZeroU32) -> Self {
        Self {
            cadence,
            windows: HashMap::new(),
        }
    }

    pub fn cadence(&self) -> NonZeroU32 {
        self.cadence
    }

    /// Records one consumed video. Fires exactly on every N-th call and
    /// restarts the window immediately.
    pub fn on_video_consumed(&mut self, identity: &Identity, video_id: &str) -> CadenceSignal {
        let count = self.windows.entry(identity.clone()).or_insert(0);
        *count += 1;

        if *count < self.cadence.get() {
            return CadenceSignal::default();
        }

        *count = 0;
        debug!(%identity, video_id, "feedback cadence reached");
        CadenceSignal {
            feedback_required: true,
            video_id_for_feedback: Some(video_id.to_string()),
        }
    }

    /// Videos consumed in the current window.
    pub fn pending(&self, identity: &Identity) -> u32 {
        self.windows.get(identity).copied().unwrap_or(0)
    }

    /// Starts a fresh window, e.g. after feedback was submitted or skipped.
    pub fn reset(&mut self, identity: &Identity) {
        self.windows.remove(identity);
    }
}
