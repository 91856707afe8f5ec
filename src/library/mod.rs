//! Local library of recorded videos
//!
//! The library keeps its list in an injected [`KeyValueStore`] under a single
//! key, serialized as JSON with RFC 3339 timestamps. Records whose front and
//! back media have both disappeared are dropped the next time it is loaded.

mod export;
mod kv;
mod store;

pub use export::{export_video, DirectoryMediaLibrary, MediaLibrary};
pub use kv::{is_valid_key, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{LibraryEvent, LibraryStore};

use crate::config::LibraryConfig;
use crate::errors::DuoCamError;

/// Open the file-backed library described by `config`, without loading it
pub fn open_library(config: &LibraryConfig) -> Result<LibraryStore<FileKeyValueStore>, DuoCamError> {
    let store = FileKeyValueStore::open(&config.store_directory)?;
    Ok(LibraryStore::new(store, config.storage_key.clone()))
}
