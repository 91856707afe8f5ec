//! Export of recordings into an external media library

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::DuoCamError;
use crate::permissions::PermissionStatus;
use crate::types::RecordedVideo;

/// External media library that recordings can be imported into
pub trait MediaLibrary {
    /// Ask for add-only access; implementations prompt at most once
    fn request_authorization(&mut self) -> PermissionStatus;

    /// Import `source` as a new asset and return the asset identifier
    fn import_video(&mut self, source: &Path) -> Result<String, DuoCamError>;
}

/// Media library rooted in a directory on disk
///
/// Authorization is decided on the first request and remembered.
#[derive(Debug, Clone)]
pub struct DirectoryMediaLibrary {
    root: PathBuf,
    allow: bool,
    status: PermissionStatus,
}

impl DirectoryMediaLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            allow: true,
            status: PermissionStatus::NotDetermined,
        }
    }

    /// Library whose authorization prompt is always refused
    pub fn denying<P: AsRef<Path>>(root: P) -> Self {
        Self {
            allow: false,
            ..Self::new(root)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn authorization(&self) -> PermissionStatus {
        self.status
    }
}

impl MediaLibrary for DirectoryMediaLibrary {
    fn request_authorization(&mut self) -> PermissionStatus {
        if self.status == PermissionStatus::NotDetermined {
            self.status = if self.allow {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            log::info!("Media library {:?} access: {}", self.root, self.status);
        }
        self.status
    }

    fn import_video(&mut self, source: &Path) -> Result<String, DuoCamError> {
        if !self.status.is_granted() {
            return Err(DuoCamError::PermissionDenied(format!(
                "media library access is {}",
                self.status
            )));
        }
        if !source.exists() {
            return Err(DuoCamError::MediaMissing(format!("{:?}", source)));
        }

        fs::create_dir_all(&self.root)
            .map_err(|e| DuoCamError::ExportFailed(format!("Failed to create {:?}: {}", self.root, e)))?;

        let asset_id = Uuid::new_v4().to_string();
        let file_name = match source.extension() {
            Some(ext) => format!("{}.{}", asset_id, ext.to_string_lossy()),
            None => asset_id.clone(),
        };
        let target = self.root.join(file_name);
        fs::copy(source, &target)
            .map_err(|e| DuoCamError::ExportFailed(format!("Failed to copy to {:?}: {}", target, e)))?;

        Ok(asset_id)
    }
}

/// Authorize add-only access and import the record's primary media
pub fn export_video<L: MediaLibrary + ?Sized>(
    video: &RecordedVideo,
    library: &mut L,
) -> Result<String, DuoCamError> {
    let status = library.request_authorization();
    if !status.is_granted() {
        return Err(DuoCamError::PermissionDenied(format!(
            "media library access is {}",
            status
        )));
    }
    library.import_video(video.primary_media())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_is_asked_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = DirectoryMediaLibrary::denying(dir.path());
        assert_eq!(library.authorization(), PermissionStatus::NotDetermined);
        assert_eq!(library.request_authorization(), PermissionStatus::Denied);
        library.allow = true;
        assert_eq!(library.request_authorization(), PermissionStatus::Denied);
    }

    #[test]
    fn test_import_requires_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        fs::write(&source, b"data").unwrap();

        let mut library = DirectoryMediaLibrary::new(dir.path().join("lib"));
        assert!(matches!(
            library.import_video(&source),
            Err(DuoCamError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_export_copies_primary_media() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("front.mp4");
        let combined = dir.path().join("combined.mp4");
        fs::write(&front, b"front").unwrap();
        fs::write(&combined, b"combined").unwrap();

        let video = RecordedVideo::new(front, dir.path().join("back.mp4"), 2.0)
            .with_combined(combined);
        let mut library = DirectoryMediaLibrary::new(dir.path().join("lib"));

        let asset = export_video(&video, &mut library).unwrap();
        let copied = fs::read(library.root().join(format!("{}.mp4", asset))).unwrap();
        assert_eq!(copied, b"combined");
    }
}
