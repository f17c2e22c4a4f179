// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key-value backends for the letter cache
//!
//! Each scope is one serialized document under one key. Documents are
//! always read and written whole.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Persistent key-value store holding one document per scope key.
pub trait LetterStore: Send + Sync {
    /// Returns the document under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the document under `key`.
    fn save(&self, key: &str, document: &str) -> Result<(), StoreError>;

    /// Deletes the document under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: LetterStore + ?Sized> LetterStore for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, document: &str) -> Result<(), StoreError> {
        (**self).save(key, document)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-process store. Share it between handles with `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LetterStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(documents.get(key).cloned())
    }

    fn save(&self, key: &str, document: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        documents.insert(key.to_string(), document.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().map_err(|_| StoreError::Poisoned)?;
        documents.remove(key);
        Ok(())
    }
}

/// One file per scope key inside a directory.
///
/// File names are the hex encoding of the key so arbitrary identities map to
/// safe paths.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key.as_bytes())))
    }
}

impl LetterStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, document: &str) -> Result<(), StoreError> {
        atomic_write(&self.path_for(key), document.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Atomic file write (write to temp, then rename)
///
/// Readers see either the old document or the new one, never a partial
/// write. Every write gets its own temp file in the target directory, so
/// concurrent writers never share one. The temp file is removed if any
/// step fails.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;

    temp.write_all(data)?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Errors from a cache backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");

        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        // Only the target file remains
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_store_concurrent_writers_same_key() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(temp.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let doc = format!("{{\"writer\":{},\"seq\":{}}}", t, i);
                        store.save("penpal.letters.id.abc", &doc).unwrap();
                        let read = store.load("penpal.letters.id.abc").unwrap().unwrap();
                        serde_json::from_str::<serde_json::Value>(&read).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // No temp files left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_store_roundtrip_and_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("letters")).unwrap();

        assert_eq!(store.load("penpal.letters.abc").unwrap(), None);
        store.save("penpal.letters.abc", "{}").unwrap();
        assert_eq!(store.load("penpal.letters.abc").unwrap().as_deref(), Some("{}"));

        store.remove("penpal.letters.abc").unwrap();
        store.remove("penpal.letters.abc").unwrap();
        assert_eq!(store.load("penpal.letters.abc").unwrap(), None);
    }

    #[test]
    fn test_memory_store_shared_through_arc() {
        let store = Arc::new(MemoryStore::new());
        let other = Arc::clone(&store);

        store.save("k", "v").unwrap();
        assert_eq!(other.load("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
    }
}
