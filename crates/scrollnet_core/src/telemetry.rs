//! crates/scrollnet_core/src/telemetry.rs
//!
//! Telemetry sinks for degraded-mode events.

use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::ports::{DegradedEvent, TelemetrySink};

/// Logs every degraded event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&self, event: DegradedEvent) {
        match event {
            DegradedEvent::InteractionDropped {
                video_id,
                kind,
                reason,
            } => warn!(%video_id, %kind, %reason, "interaction not persisted"),
            DegradedEvent::FeedbackDropped { video_id, reason } => {
                warn!(%video_id, %reason, "feedback not persisted")
            }
            DegradedEvent::FeedFallback { offset, reason } => {
                warn!(offset, %reason, "serving placeholder feed")
            }
            DegradedEvent::IdentityResolutionFailure { reason } => {
                warn!(%reason, "falling back to anonymous identity")
            }
        }
    }
}

/// Keeps every event in memory. Clone-friendly via Arc.
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    events: Arc<Mutex<Vec<DegradedEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DegradedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&self, event: DegradedEvent) {
        TracingTelemetry.record(event.clone());
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
