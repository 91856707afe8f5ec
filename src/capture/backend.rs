//! Boundary to the platform capture subsystem

use std::path::Path;

use crate::errors::DuoCamError;
use crate::permissions::PermissionInfo;
use crate::types::CameraPosition;

/// Platform capture subsystem driving the two physical channels
///
/// Implementations own device access and encoding. The controller only asks
/// a channel to begin writing to a location and later to stop; output
/// existence is checked separately after a grace period.
pub trait CaptureBackend: Send + 'static {
    /// Current camera authorization
    fn capture_permission(&self) -> PermissionInfo;

    /// Whether the device behind `position` can be opened at all
    fn is_channel_available(&self, position: CameraPosition) -> bool;

    /// Begin writing `position` to `output`
    fn start_channel(&mut self, position: CameraPosition, output: &Path) -> Result<(), DuoCamError>;

    /// Stop writing `position`; finalization may complete asynchronously
    fn stop_channel(&mut self, position: CameraPosition) -> Result<(), DuoCamError>;
}

/// Backend for hosts without capture hardware
///
/// Reports no channels, which puts the controller in simulated mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCaptureBackend;

impl CaptureBackend for NullCaptureBackend {
    fn capture_permission(&self) -> PermissionInfo {
        PermissionInfo::denied("No capture hardware on this host")
    }

    fn is_channel_available(&self, _position: CameraPosition) -> bool {
        false
    }

    fn start_channel(&mut self, position: CameraPosition, _output: &Path) -> Result<(), DuoCamError> {
        Err(DuoCamError::DeviceUnavailable(format!("{} camera", position)))
    }

    fn stop_channel(&mut self, _position: CameraPosition) -> Result<(), DuoCamError> {
        Ok(())
    }
}
