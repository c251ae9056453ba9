//! File-backed client storage.
//!
//! The whole key/value map lives in one JSON file:
//! ```json
//! {
//!   "accessToken": "eyJhbGciOi...",
//!   "authProvider": "local",
//!   "session": "{\"ID\":3,\"Username\":\"alice\"}"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use beetime_application::ports::{KeyValueStorage, StorageError};

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

fn to_storage_error(e: SerializationError) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Key/value storage persisted to a JSON file.
///
/// The file is read once by [`FileStorage::open`]. Reads are served from
/// memory; every mutation rewrites the file before it becomes visible.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage file, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read(&path) {
            Ok(content) => from_json_bytes(&content).map_err(to_storage_error)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        debug!(path = %path.display(), keys = entries.len(), "client storage opened");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// `<config dir>/beetime/storage.json`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("beetime").join("storage.json"))
    }

    /// Location of the storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = to_json_stable_bytes(entries).map_err(to_storage_error)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Applies `change` to a copy of the map, writes it, then publishes it.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        change(&mut next);
        if next != *entries {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(BTreeMap::clear)
    }
}
