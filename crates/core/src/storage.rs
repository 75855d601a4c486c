use std::collections::HashMap;
use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::write_atomic;

/// Key under which the project graph is stored.
pub const PROJECTS_KEY: &str = "codehub-projects";

/// Errors raised by storage adapters.  
/// 儲存轉接層的錯誤。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Opaque key-value persistence used by the workspace store.  
/// 工作區使用的鍵值持久化介面。
pub trait StorageAdapter {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-process storage, mostly for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value without counting it as a write.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Number of `set` calls observed so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Directory-backed storage: each key maps to `<root>/<key>.json`.  
/// 以資料夾儲存：每個鍵對應 `<root>/<key>.json`。
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the backing file for `key`, rejecting keys that could escape the root.  
    /// 解析鍵對應的檔案路徑，拒絕可能跳出根目錄的鍵。
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl StorageAdapter for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        write_atomic(&path, value.as_bytes()).map_err(|source| StorageError::Io {
            key: key.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_storage_counts_writes() {
        let mut storage = MemoryStorage::new().with_entry("seed", "x");
        assert_eq!(storage.write_count(), 0);
        storage.set(PROJECTS_KEY, "[]").unwrap();
        storage.set(PROJECTS_KEY, "[ ]").unwrap();
        assert_eq!(storage.write_count(), 2);
        assert_eq!(storage.get(PROJECTS_KEY).unwrap().as_deref(), Some("[ ]"));
        assert_eq!(storage.get("seed").unwrap().as_deref(), Some("x"));
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn file_storage_round_trips_and_reports_missing_keys() {
        let tmp = tempdir().unwrap();
        let mut storage = FileStorage::new(tmp.path().join("data"));

        assert_eq!(storage.get(PROJECTS_KEY).unwrap(), None);
        storage.set(PROJECTS_KEY, r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            storage.get(PROJECTS_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(tmp.path().join("data").join("codehub-projects.json").exists());
        assert!(!tmp
            .path()
            .join("data")
            .join("codehub-projects.json.tmp")
            .exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let tmp = tempdir().unwrap();
        let mut storage = FileStorage::new(tmp.path());
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                storage.set(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}
