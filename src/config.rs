//! Configuration management for duocam
//!
//! Provides loading, saving and validation of capture output locations, the
//! library store location and feed fixture settings.

use crate::errors::DuoCamError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DuoCamConfig {
    pub capture: CaptureConfig,
    pub library: LibraryConfig,
    pub feed: FeedConfig,
}

/// Capture session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory channel outputs are written to
    pub output_directory: PathBuf,
    /// Always run in simulated mode, even when channels are available
    pub simulated: bool,
    /// Wait after stopping the channels before checking their outputs
    pub finalize_grace_ms: u64,
    /// Extension given to channel output files
    pub file_extension: String,
}

/// Library persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory backing the key-value store
    pub store_directory: PathBuf,
    /// Key the recorded video list is stored under
    pub storage_key: String,
}

/// Feed source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Simulated fetch latency in milliseconds
    pub latency_ms: u64,
    /// Optional JSON file replacing the built-in posts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("./recordings"),
            simulated: false,
            finalize_grace_ms: 500,
            file_extension: "mp4".to_string(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            store_directory: PathBuf::from("./duocam-store"),
            storage_key: "recorded_videos".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1000,
            fixture_path: None,
        }
    }
}

impl CaptureConfig {
    pub fn finalize_grace(&self) -> Duration {
        Duration::from_millis(self.finalize_grace_ms)
    }
}

impl FeedConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl DuoCamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DuoCamError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| DuoCamError::Config(format!("Failed to read config file: {}", e)))?;

        let config: DuoCamConfig = toml::from_str(&contents)
            .map_err(|e| DuoCamError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DuoCamError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DuoCamError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| DuoCamError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| DuoCamError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("duocam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.capture.output_directory.as_os_str().is_empty() {
            return Err("Capture output directory must not be empty".to_string());
        }
        if self.capture.finalize_grace_ms > 10_000 {
            return Err("Finalize grace must be at most 10000 ms".to_string());
        }
        if self.capture.file_extension.is_empty()
            || !self.capture.file_extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err("File extension must be non-empty and alphanumeric".to_string());
        }

        if self.library.store_directory.as_os_str().is_empty() {
            return Err("Library store directory must not be empty".to_string());
        }
        if !crate::library::is_valid_key(&self.library.storage_key) {
            return Err(format!("Invalid storage key: {:?}", self.library.storage_key));
        }

        if self.feed.latency_ms > 60_000 {
            return Err("Feed latency must be at most 60000 ms".to_string());
        }

        Ok(())
    }
}
