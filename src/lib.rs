//! duocam: dual front/back camera recording core
//!
//! This crate provides the non-visual core of a dual-camera recording app:
//! a capture session that drives two channels at once, a persisted library
//! of recordings and a short-video feed source.
//!
//! # Features
//! - Simultaneous front/back recording with a hard 15 second ceiling
//! - Simulated capture when no hardware or permission is available
//! - Most-recent-first video library persisted to an injected key-value store
//! - Lazy purge of records whose media files have disappeared
//! - Export into an external media library
//! - Fixture-backed feed with simulated latency
//!
//! # Usage
//! ```rust,ignore
//! use duocam::capture::CaptureSessionController;
//! use duocam::config::DuoCamConfig;
//! use duocam::library::open_library;
//!
//! let config = DuoCamConfig::load_or_default();
//! let controller = CaptureSessionController::simulated(config.capture.clone());
//! let mut library = open_library(&config.library)?;
//! library.load();
//!
//! controller.start().await;
//! if let Some(outcome) = controller.stop().await {
//!     library.append(outcome.video)?;
//! }
//! ```
pub mod capture;
pub mod config;
pub mod errors;
pub mod feed;
pub mod library;
pub mod permissions;
pub mod timing;
pub mod types;

// Testing utilities - synthetic capture for offline testing
pub mod testing;

// Re-exports for convenience
pub use capture::{CaptureBackend, CaptureOutcome, CaptureSessionController, CaptureStatus};
pub use config::DuoCamConfig;
pub use errors::DuoCamError;
pub use feed::{FeedSource, MockFeedSource};
pub use library::{KeyValueStore, LibraryStore};
pub use types::{CameraPosition, FeedPost, RecordedVideo, RecordingState};

/// Route `log` output through env_logger, quiet apart from duocam's own info
///
/// Respects an existing `RUST_LOG`; calling it twice is harmless.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "duocam=info");
    }
    let _ = env_logger::try_init();
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Package name, version and description, shown in the `duocam-cli config` header
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "duocam");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }
}
