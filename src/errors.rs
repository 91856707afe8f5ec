use thiserror::Error;

/// Failures raised at the internal seams (capture backend, key-value store,
/// media library). Public operations degrade these into optional or boolean
/// results instead of passing them up.
#[derive(Debug, Error)]
pub enum DuoCamError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Persisted data corrupt: {0}")]
    PersistenceCorrupt(String),
    #[error("Media missing: {0}")]
    MediaMissing(String),
    #[error("Export failed: {0}")]
    ExportFailed(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for DuoCamError {
    fn from(e: std::io::Error) -> Self {
        DuoCamError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for DuoCamError {
    fn from(e: serde_json::Error) -> Self {
        DuoCamError::PersistenceCorrupt(e.to_string())
    }
}
