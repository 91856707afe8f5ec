//! Core data types shared by the capture, library and feed modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One of the two physical capture channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
}

impl CameraPosition {
    pub const ALL: [CameraPosition; 2] = [CameraPosition::Front, CameraPosition::Back];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraPosition::Front => "front",
            CameraPosition::Back => "back",
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    Idle,
    Recording,
    Stopping,
}

/// A dual-channel recording owned by the library
///
/// Immutable once created. The front and back references are always set, even
/// for placeholder results, where they point at locations that never exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedVideo {
    pub id: Uuid,
    pub front_path: PathBuf,
    pub back_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Vec<u8>>,
}

impl RecordedVideo {
    /// Create a record with a fresh identifier and the current time
    pub fn new(front_path: PathBuf, back_path: PathBuf, duration_secs: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            front_path,
            back_path,
            combined_path: None,
            created_at: Utc::now(),
            duration_secs: duration_secs.max(0.0),
            thumbnail: None,
        }
    }

    pub fn with_combined(mut self, path: PathBuf) -> Self {
        self.combined_path = Some(path);
        self
    }

    pub fn with_thumbnail(mut self, bytes: Vec<u8>) -> Self {
        self.thumbnail = Some(bytes);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// The combined output when present, otherwise the front output
    pub fn primary_media(&self) -> &Path {
        self.combined_path.as_deref().unwrap_or(&self.front_path)
    }

    /// Every distinct file this record refers to
    pub fn media_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = vec![self.front_path.as_path()];
        if self.back_path != self.front_path {
            paths.push(self.back_path.as_path());
        }
        if let Some(combined) = self.combined_path.as_deref() {
            if !paths.contains(&combined) {
                paths.push(combined);
            }
        }
        paths
    }

    /// True when at least one of the two required channel outputs exists
    pub fn has_resolvable_media(&self) -> bool {
        self.front_path.exists() || self.back_path.exists()
    }
}

/// A post in the short-video feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub media_url: String,
    pub thumbnail_url: String,
    pub views: u64,
    pub likes: u64,
    pub description: String,
    pub duration_secs: f64,
}

impl FeedPost {
    pub fn formatted_views(&self) -> String {
        format_count(self.views)
    }

    pub fn formatted_likes(&self) -> String {
        format_count(self.likes)
    }

    /// Duration as `m:ss`
    pub fn formatted_duration(&self) -> String {
        let total = self.duration_secs.max(0.0).round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

/// Compact count formatting used for views and likes (`999`, `1.2K`, `3.4M`)
pub fn format_count(count: u64) -> String {
    match count {
        0..=999 => count.to_string(),
        1_000..=999_999 => trim_decimal(count as f64 / 1_000.0, "K"),
        1_000_000..=999_999_999 => trim_decimal(count as f64 / 1_000_000.0, "M"),
        _ => trim_decimal(count as f64 / 1_000_000_000.0, "B"),
    }
}

fn trim_decimal(value: f64, suffix: &str) -> String {
    let rounded = (value * 10.0).floor() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, suffix)
    } else {
        format!("{:.1}{}", rounded, suffix)
    }
}

/// Human readable byte size using decimal units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1_000 {
        return if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", bytes)
        };
    }

    let mut value = bytes as f64 / 1_000.0;
    let mut unit = 0;
    while value >= 1_000.0 && unit < UNITS.len() - 1 {
        value /= 1_000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_media_prefers_combined() {
        let video = RecordedVideo::new("f.mp4".into(), "b.mp4".into(), 3.0);
        assert_eq!(video.primary_media(), Path::new("f.mp4"));

        let video = video.with_combined("c.mp4".into());
        assert_eq!(video.primary_media(), Path::new("c.mp4"));
    }

    #[test]
    fn test_media_paths_skip_duplicates() {
        let video = RecordedVideo::new("f.mp4".into(), "b.mp4".into(), 1.0)
            .with_combined("f.mp4".into());
        assert_eq!(video.media_paths().len(), 2);
    }

    #[test]
    fn test_negative_duration_clamped() {
        let video = RecordedVideo::new("f.mp4".into(), "b.mp4".into(), -2.0);
        assert_eq!(video.duration_secs, 0.0);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1K");
        assert_eq!(format_count(1_250), "1.2K");
        assert_eq!(format_count(3_400_000), "3.4M");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(1), "1 byte");
        assert_eq!(format_bytes(1_500), "1.5 KB");
        assert_eq!(format_bytes(12_300_000), "12.3 MB");
    }

    #[test]
    fn test_formatted_duration() {
        let post = FeedPost {
            id: "p".to_string(),
            title: String::new(),
            creator: String::new(),
            media_url: String::new(),
            thumbnail_url: String::new(),
            views: 0,
            likes: 0,
            description: String::new(),
            duration_secs: 75.0,
        };
        assert_eq!(post.formatted_duration(), "1:15");
    }

    #[test]
    fn test_recorded_video_timestamps_are_iso8601() {
        let video = RecordedVideo::new("f.mp4".into(), "b.mp4".into(), 2.5);
        let json = serde_json::to_value(&video).unwrap();
        let created = json["created_at"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(created).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), video.created_at);
    }
}
