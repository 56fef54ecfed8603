//! Key-value storage capability backing the resource cache.
//!
//! | Store | Lifetime |
//! |-------|----------|
//! | [`MemoryStore`] | process |
//! | [`FileStore`] | persistent, one hashed file per key |

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::StoreError;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// String key-value store.
///
/// Implementations must be `Send + Sync`; several views may share one store.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

    /// Removing a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    fn keys<'a>(&'a self) -> StoreFuture<'a, Vec<String>>;
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<tokio::sync::RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.inner.read().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.inner.write().await.insert(key.to_owned(), value);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.inner.write().await.remove(key);
            Ok(())
        })
    }

    fn keys<'a>(&'a self) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move { Ok(self.inner.read().await.keys().cloned().collect()) })
    }
}

/// Directory-backed store.
///
/// Each key maps to `<dir>/<sha256 of key>.json`, a record holding the key
/// and its value, so file names stay short whatever the key length.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

const FILE_SUFFIX: &str = ".json";

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    value: String,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{digest:x}{FILE_SUFFIX}"))
    }

    async fn read_record(path: &Path) -> Result<Option<StoredRecord>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let record = Self::read_record(&self.path_for(key)).await?;
            Ok(record
                .filter(|record| record.key == key)
                .map(|record| record.value))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let record = StoredRecord {
                key: key.to_owned(),
                value,
            };
            tokio::fs::write(self.path_for(key), serde_json::to_vec(&record)?).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            match tokio::fs::remove_file(self.path_for(key)).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(error.into()),
            }
        })
    }

    fn keys<'a>(&'a self) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            let mut keys = Vec::new();
            let mut entries = tokio::fs::read_dir(&self.dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if !entry.file_name().to_string_lossy().ends_with(FILE_SUFFIX) {
                    continue;
                }
                match Self::read_record(&path).await {
                    Ok(Some(record)) => keys.push(record.key),
                    Ok(None) => {}
                    Err(error) => debug!(path = %path.display(), %error, "skipping unreadable store file"),
                }
            }
            keys.sort();
            Ok(keys)
        })
    }
}
