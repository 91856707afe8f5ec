//! Synthetic capture backend and library fixtures
//!
//! Lets the controller run its real-mode path without camera hardware: each
//! started channel writes a small deterministic payload when it is stopped.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::capture::CaptureBackend;
use crate::errors::DuoCamError;
use crate::permissions::{PermissionInfo, PermissionStatus};
use crate::types::{CameraPosition, RecordedVideo};

/// Marker at the start of every synthetic media file
pub const SYNTHETIC_MAGIC: &[u8] = b"DUOCAM-SYNTHETIC";

/// Channel calls observed by a [`SyntheticCaptureBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Started(CameraPosition, PathBuf),
    Stopped(CameraPosition),
}

/// Capture backend that writes synthetic media files
#[derive(Debug, Clone)]
pub struct SyntheticCaptureBackend {
    permission: PermissionStatus,
    unavailable: HashSet<CameraPosition>,
    failing: HashSet<CameraPosition>,
    dropping: HashSet<CameraPosition>,
    payload_len: usize,
    active: HashMap<CameraPosition, PathBuf>,
    events: Arc<Mutex<Vec<ChannelEvent>>>,
}

impl Default for SyntheticCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticCaptureBackend {
    /// Both channels available, permission granted, 4 KiB per output
    pub fn new() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            unavailable: HashSet::new(),
            failing: HashSet::new(),
            dropping: HashSet::new(),
            payload_len: 4096,
            active: HashMap::new(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_permission(mut self, status: PermissionStatus) -> Self {
        self.permission = status;
        self
    }

    /// Report `position` as having no device
    pub fn without_channel(mut self, position: CameraPosition) -> Self {
        self.unavailable.insert(position);
        self
    }

    /// Make `start_channel` fail for `position`
    pub fn failing_channel(mut self, position: CameraPosition) -> Self {
        self.failing.insert(position);
        self
    }

    /// Start `position` normally but never write its output
    pub fn dropping_output(mut self, position: CameraPosition) -> Self {
        self.dropping.insert(position);
        self
    }

    pub fn with_payload_len(mut self, len: usize) -> Self {
        self.payload_len = len.max(SYNTHETIC_MAGIC.len());
        self
    }

    /// Shared handle to the recorded channel calls
    pub fn events(&self) -> Arc<Mutex<Vec<ChannelEvent>>> {
        self.events.clone()
    }

    fn record(&self, event: ChannelEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl CaptureBackend for SyntheticCaptureBackend {
    fn capture_permission(&self) -> PermissionInfo {
        PermissionInfo {
            status: self.permission,
            message: "synthetic capture".to_string(),
            can_request: false,
        }
    }

    fn is_channel_available(&self, position: CameraPosition) -> bool {
        !self.unavailable.contains(&position)
    }

    fn start_channel(&mut self, position: CameraPosition, output: &Path) -> Result<(), DuoCamError> {
        if self.unavailable.contains(&position) {
            return Err(DuoCamError::DeviceUnavailable(format!("{} camera", position)));
        }
        if self.failing.contains(&position) {
            return Err(DuoCamError::DeviceUnavailable(format!(
                "{} camera refused to start",
                position
            )));
        }
        self.active.insert(position, output.to_path_buf());
        self.record(ChannelEvent::Started(position, output.to_path_buf()));
        Ok(())
    }

    fn stop_channel(&mut self, position: CameraPosition) -> Result<(), DuoCamError> {
        let output = self.active.remove(&position).ok_or_else(|| {
            DuoCamError::DeviceUnavailable(format!("{} channel is not running", position))
        })?;
        self.record(ChannelEvent::Stopped(position));

        if self.dropping.contains(&position) {
            return Ok(());
        }
        fs::write(&output, synthetic_payload(position, self.payload_len))?;
        Ok(())
    }
}

/// Deterministic media bytes for one channel
pub fn synthetic_payload(position: CameraPosition, len: usize) -> Vec<u8> {
    let seed = match position {
        CameraPosition::Front => 0x3Du8,
        CameraPosition::Back => 0xB7u8,
    };
    let mut data = Vec::with_capacity(len.max(SYNTHETIC_MAGIC.len()));
    data.extend_from_slice(SYNTHETIC_MAGIC);
    let mut i = 0usize;
    while data.len() < len {
        data.push(seed.wrapping_add((i % 251) as u8));
        i += 1;
    }
    data
}

/// Write both channel files into `dir` and return a record pointing at them
pub fn synthetic_recording(dir: &Path, name: &str, payload_len: usize) -> std::io::Result<RecordedVideo> {
    fs::create_dir_all(dir)?;
    let front = dir.join(format!("{}-front.mp4", name));
    let back = dir.join(format!("{}-back.mp4", name));
    fs::write(&front, synthetic_payload(CameraPosition::Front, payload_len))?;
    fs::write(&back, synthetic_payload(CameraPosition::Back, payload_len))?;
    Ok(RecordedVideo::new(front, back, 15.0))
}
