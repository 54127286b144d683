//! Durable storage for the single CV document.
//!
//! The editor keeps exactly one document under one fixed key. Storage
//! problems never reach the caller: a failed write leaves the in-memory
//! document authoritative, and an unreadable key reads as "first run".

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::document::migration::normalize;
use crate::models::document::Document;

/// Key under which the serialized document lives.
pub const STORAGE_KEY: &str = "cv-data";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// FileStore
// ────────────────────────────────────────────────────────────────────────────

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated document behind.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("File store ready at {}", dir.display());
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ────────────────────────────────────────────────────────────────────────────

/// Volatile store used for `STORAGE_DIR=:memory:` and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DocumentStore
// ────────────────────────────────────────────────────────────────────────────

/// Saves and loads the document under `STORAGE_KEY`. Never returns an error.
#[derive(Clone)]
pub struct DocumentStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        DocumentStore { kv }
    }

    /// Writes the full document. Failures are logged and dropped.
    pub fn save(&self, doc: &Document) {
        let serialized = match serde_json::to_string(doc) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to serialize document for saving: {e}");
                return;
            }
        };
        match self.kv.set(STORAGE_KEY, &serialized) {
            Ok(()) => debug!("Document saved ({} bytes)", serialized.len()),
            Err(e) => error!("Failed to save document: {e}"),
        }
    }

    /// Reads the stored document, migrated to the current schema.
    ///
    /// Returns `None` when nothing is stored or the stored text is unreadable;
    /// callers treat both as a first run.
    pub fn load(&self) -> Option<Document> {
        let raw = match self.kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read stored document: {e}");
                return None;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => Some(normalize(&value)),
            Err(e) => {
                warn!("Stored document is corrupt, ignoring it: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{Experience, NamedItem};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn sample_document() -> Document {
        Document {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            skills: vec![NamedItem {
                id: "1-a".to_string(),
                name: "Analyse".to_string(),
            }],
            experience: vec![Experience {
                id: "1-b".to_string(),
                title: "Analyste".to_string(),
                current: true,
                responsibilities: vec!["Notes sur la machine".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_load_from_empty_store_is_none() {
        let store = DocumentStore::new(Arc::new(MemoryStore::default()));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = DocumentStore::new(Arc::new(MemoryStore::default()));
        let doc = sample_document();
        store.save(&doc);
        assert_eq!(store.load(), Some(doc));
    }

    #[test]
    fn test_corrupt_data_loads_as_none() {
        let kv = Arc::new(MemoryStore::default());
        kv.set(STORAGE_KEY, "{not json").unwrap();
        let store = DocumentStore::new(kv);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_legacy_data_is_migrated_on_load() {
        let kv = Arc::new(MemoryStore::default());
        kv.set(STORAGE_KEY, r#"{"fullName":"Ada","skills":"Rust, Go"}"#)
            .unwrap();
        let doc = DocumentStore::new(kv).load().unwrap();
        assert_eq!(doc.skills.len(), 2);
        assert_eq!(doc.skills[1].name, "Go");
    }

    #[test]
    fn test_failing_store_never_panics() {
        let store = DocumentStore::new(Arc::new(BrokenStore));
        store.save(&sample_document());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");
        let kv = FileStore::open(&root).unwrap();
        assert_eq!(kv.get(STORAGE_KEY).unwrap(), None);
        kv.set(STORAGE_KEY, "{}").unwrap();
        assert_eq!(kv.get(STORAGE_KEY).unwrap().as_deref(), Some("{}"));
        assert!(root.join("cv-data.json").exists());
        assert!(!root.join("cv-data.json.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            kv.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_document_store_over_files_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_document();
        DocumentStore::new(Arc::new(FileStore::open(dir.path()).unwrap())).save(&doc);
        let reopened = DocumentStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        assert_eq!(reopened.load(), Some(doc));
    }
}
