//! Access status shared by the camera backend and the media library export

/// Outcome of asking for camera or media library access
///
/// Anything other than `Granted` sends capture into simulated mode and makes
/// export fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Never asked; the first request decides
    NotDetermined,
    /// Blocked by device policy, asking again will not help
    Restricted,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        *self == PermissionStatus::Granted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::NotDetermined => "not_determined",
            PermissionStatus::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera access as reported by a capture backend
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

impl PermissionInfo {
    pub fn granted(message: impl Into<String>) -> Self {
        Self {
            status: PermissionStatus::Granted,
            message: message.into(),
            can_request: false,
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            status: PermissionStatus::Denied,
            message: message.into(),
            can_request: false,
        }
    }
}
