use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::export::{export_video, MediaLibrary};
use super::kv::KeyValueStore;
use crate::errors::DuoCamError;
use crate::types::{format_bytes, RecordedVideo};

const EVENT_CAPACITY: usize = 32;

/// Change notifications published by [`LibraryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    Loaded { count: usize },
    Appended { id: Uuid },
    Removed { ids: Vec<Uuid> },
    /// Records dropped by reconciliation because none of their media exists
    Purged { ids: Vec<Uuid> },
}

/// Most-recent-first list of recordings persisted under one key
///
/// Every mutation rewrites the whole list. Mutations update the in-memory
/// list first; an `Err` only means the persisted copy was not written.
pub struct LibraryStore<S: KeyValueStore> {
    store: S,
    key: String,
    videos: Vec<RecordedVideo>,
    events: broadcast::Sender<LibraryEvent>,
}

impl<S: KeyValueStore> LibraryStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            key: key.into(),
            videos: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    pub fn videos(&self) -> &[RecordedVideo] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn find(&self, id: &Uuid) -> Option<&RecordedVideo> {
        self.videos.iter().find(|v| v.id == *id)
    }

    /// Read the persisted list, then purge records without any media
    ///
    /// Unreadable or undecodable data leaves the library empty.
    pub fn load(&mut self) -> &[RecordedVideo] {
        self.videos = match self.store.get(&self.key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<RecordedVideo>>(&bytes) {
                Ok(videos) => videos,
                Err(e) => {
                    log::warn!(
                        "{}",
                        DuoCamError::PersistenceCorrupt(format!("{}: {}", self.key, e))
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read library: {}", e);
                Vec::new()
            }
        };

        let (kept, purged): (Vec<_>, Vec<_>) = std::mem::take(&mut self.videos)
            .into_iter()
            .partition(RecordedVideo::has_resolvable_media);
        self.videos = kept;

        if !purged.is_empty() {
            let ids: Vec<Uuid> = purged.iter().map(|v| v.id).collect();
            log::info!("Purged {} recording(s) with no media on disk", ids.len());
            if let Err(e) = self.persist() {
                log::warn!("Failed to rewrite library after purge: {}", e);
            }
            self.notify(LibraryEvent::Purged { ids });
        }

        log::debug!("Loaded {} recording(s)", self.videos.len());
        self.notify(LibraryEvent::Loaded {
            count: self.videos.len(),
        });
        &self.videos
    }

    /// Insert `video` at the front and persist
    pub fn append(&mut self, video: RecordedVideo) -> Result<(), DuoCamError> {
        let id = video.id;
        self.videos.retain(|v| v.id != id);
        self.videos.insert(0, video);
        self.notify(LibraryEvent::Appended { id });
        self.persist()
    }

    /// Remove records by id, deleting their media best-effort
    ///
    /// Returns the number of records removed.
    pub fn remove(&mut self, ids: &[Uuid]) -> Result<usize, DuoCamError> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.videos)
            .into_iter()
            .partition(|v| wanted.contains(&v.id));
        self.videos = kept;
        self.finish_removal(removed)
    }

    /// Remove records by position in the current list
    ///
    /// Out-of-range indices are ignored.
    pub fn remove_at(&mut self, indices: &[usize]) -> Result<usize, DuoCamError> {
        let wanted: HashSet<usize> = indices.iter().copied().collect();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.videos)
            .into_iter()
            .enumerate()
            .partition(|(i, _)| wanted.contains(i));
        self.videos = kept.into_iter().map(|(_, v)| v).collect();
        self.finish_removal(removed.into_iter().map(|(_, v)| v).collect())
    }

    fn finish_removal(&mut self, removed: Vec<RecordedVideo>) -> Result<usize, DuoCamError> {
        if removed.is_empty() {
            return Ok(0);
        }

        for video in &removed {
            for path in video.media_paths() {
                delete_media(path);
            }
        }

        let ids: Vec<Uuid> = removed.iter().map(|v| v.id).collect();
        log::info!("Removed {} recording(s)", ids.len());
        self.notify(LibraryEvent::Removed { ids });
        self.persist()?;
        Ok(removed.len())
    }

    /// Bytes on disk for one record; missing files count as zero
    pub fn size_of(video: &RecordedVideo) -> u64 {
        video.media_paths().into_iter().map(file_size).sum()
    }

    /// Size of the record with `id`, zero when it is not in the library
    pub fn size_of_id(&self, id: &Uuid) -> u64 {
        self.find(id).map(Self::size_of).unwrap_or(0)
    }

    pub fn formatted_size_of(video: &RecordedVideo) -> String {
        format_bytes(Self::size_of(video))
    }

    pub fn total_storage_used(&self) -> u64 {
        self.videos.iter().map(Self::size_of).sum()
    }

    pub fn formatted_total_storage_used(&self) -> String {
        format_bytes(self.total_storage_used())
    }

    /// Copy the record's primary media into an external library
    pub fn export_to_platform_library<L: MediaLibrary + ?Sized>(
        &self,
        video: &RecordedVideo,
        library: &mut L,
    ) -> bool {
        match export_video(video, library) {
            Ok(asset) => {
                log::info!("Exported recording {} as asset {}", video.id, asset);
                true
            }
            Err(e) => {
                log::warn!("Export of recording {} failed: {}", video.id, e);
                false
            }
        }
    }

    fn persist(&mut self) -> Result<(), DuoCamError> {
        let bytes = serde_json::to_vec(&self.videos)?;
        self.store.set(&self.key, &bytes)
    }

    fn notify(&self, event: LibraryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn delete_media(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Deleted {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to delete {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MemoryKeyValueStore;

    fn video_with_files(dir: &Path, name: &str, bytes: usize) -> RecordedVideo {
        let front = dir.join(format!("{}-front.mp4", name));
        let back = dir.join(format!("{}-back.mp4", name));
        fs::write(&front, vec![1u8; bytes]).unwrap();
        fs::write(&back, vec![2u8; bytes]).unwrap();
        RecordedVideo::new(front, back, 5.0)
    }

    #[test]
    fn test_append_is_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = LibraryStore::new(MemoryKeyValueStore::new(), "videos");
        let a = video_with_files(dir.path(), "a", 4);
        let b = video_with_files(dir.path(), "b", 4);

        library.append(a.clone()).unwrap();
        library.append(b.clone()).unwrap();
        let ids: Vec<Uuid> = library.videos().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        assert_eq!(library.remove(&[a.id]).unwrap(), 1);
        assert_eq!(library.videos().len(), 1);
        assert_eq!(library.videos()[0].id, b.id);
    }

    #[test]
    fn test_append_same_id_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = LibraryStore::new(MemoryKeyValueStore::new(), "videos");
        let a = video_with_files(dir.path(), "a", 4);
        library.append(a.clone()).unwrap();
        library.append(a).unwrap();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_size_counts_combined_once() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("combined.mp4");
        fs::write(&combined, vec![0u8; 10]).unwrap();
        let video = video_with_files(dir.path(), "s", 100).with_combined(combined);

        assert_eq!(LibraryStore::<MemoryKeyValueStore>::size_of(&video), 210);
        assert_eq!(
            LibraryStore::<MemoryKeyValueStore>::formatted_size_of(&video),
            "210 bytes"
        );
    }

    #[test]
    fn test_remove_at_ignores_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = LibraryStore::new(MemoryKeyValueStore::new(), "videos");
        library.append(video_with_files(dir.path(), "a", 1)).unwrap();
        library.append(video_with_files(dir.path(), "b", 1)).unwrap();

        assert_eq!(library.remove_at(&[1, 7]).unwrap(), 1);
        assert_eq!(library.len(), 1);
        assert_eq!(library.remove_at(&[]).unwrap(), 0);
    }

    #[test]
    fn test_events_are_published() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = LibraryStore::new(MemoryKeyValueStore::new(), "videos");
        let mut events = library.subscribe();

        let a = video_with_files(dir.path(), "a", 1);
        library.append(a.clone()).unwrap();
        library.remove(&[a.id]).unwrap();

        assert_eq!(events.try_recv().unwrap(), LibraryEvent::Appended { id: a.id });
        assert_eq!(
            events.try_recv().unwrap(),
            LibraryEvent::Removed { ids: vec![a.id] }
        );
    }
}
