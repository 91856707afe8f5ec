//! Key-value blob stores backing the library

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::DuoCamError;

/// Named-blob storage injected into the library
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DuoCamError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), DuoCamError>;
    fn remove(&mut self, key: &str) -> Result<(), DuoCamError>;
}

/// Keys are plain file-name-safe identifiers
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn check_key(key: &str) -> Result<(), DuoCamError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(DuoCamError::Config(format!("Invalid storage key: {:?}", key)))
    }
}

/// One JSON document per key inside a directory
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DuoCamError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            DuoCamError::Io(format!("Failed to create store directory {:?}: {}", root, e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DuoCamError> {
        check_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DuoCamError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DuoCamError::Io(format!("Failed to read {:?}: {}", path, e))),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), DuoCamError> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)
            .map_err(|e| DuoCamError::Io(format!("Failed to write {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| DuoCamError::Io(format!("Failed to replace {:?}: {}", path, e)))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DuoCamError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DuoCamError::Io(format!("Failed to remove {:?}: {}", path, e))),
        }
    }
}

/// In-process store, mostly for tests and ephemeral sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DuoCamError> {
        check_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), DuoCamError> {
        check_key(key)?;
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DuoCamError> {
        check_key(key)?;
        self.entries.remove(key);
        Ok(())
    }
}
