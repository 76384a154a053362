use parking_lot::RwLock;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::error::StorageError;

/// Durable string key-value storage for the local collections
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Raw value stored under `key`, if any
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Process-local storage; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the data directory if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("k").await.unwrap(), None);

        storage.write("k", "[1,2]").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("[1,2]"));

        storage.remove("k").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).await.unwrap();

        assert_eq!(storage.read("watch-later-movies").await.unwrap(), None);

        storage.write("watch-later-movies", "[]").await.unwrap();
        storage.write("watch-later-movies", "[{\"id\":1}]").await.unwrap();
        assert_eq!(
            storage.read("watch-later-movies").await.unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );
        assert!(dir.path().join("nested/watch-later-movies.json").exists());

        storage.remove("watch-later-movies").await.unwrap();
        storage.remove("watch-later-movies").await.unwrap();
        assert_eq!(storage.read("watch-later-movies").await.unwrap(), None);
    }

    #[test]
    fn test_file_names_are_sanitized() {
        let storage = FileStorage {
            dir: PathBuf::from("/data"),
        };
        assert_eq!(
            storage.path_for("../etc/passwd"),
            PathBuf::from("/data/___etc_passwd.json")
        );
    }
}
