use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{CameraPosition, RecordedVideo, RecordingState};

/// How the controller obtains media, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// No usable hardware; every recording yields a placeholder
    Simulated,
    /// Both channels are driven through the capture backend
    Real,
}

/// Snapshot published on every state change and tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub state: RecordingState,
    pub elapsed: Duration,
    pub remaining: Duration,
    /// Elapsed/ceiling ratio in `0.0..=1.0`
    pub progress: f64,
}

impl CaptureStatus {
    pub fn idle(ceiling: Duration) -> Self {
        Self {
            state: RecordingState::Idle,
            elapsed: Duration::ZERO,
            remaining: ceiling,
            progress: 0.0,
        }
    }
}

/// Where the media of a finished recording came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeSource {
    /// Both channel outputs exist
    Captured,
    /// Produced in simulated mode; no media was written
    Simulated,
    /// Real capture whose outputs were not all present after finalizing
    Fallback { missing: Vec<CameraPosition> },
}

/// Result of one recording, delivered by `stop` and the completion channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub video: RecordedVideo,
    pub source: OutcomeSource,
}

impl CaptureOutcome {
    /// True when the record carries no real capture for at least one channel
    pub fn is_placeholder(&self) -> bool {
        !matches!(self.source, OutcomeSource::Captured)
    }
}
