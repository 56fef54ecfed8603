//! Time-expiring cache of raw resource payloads.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::store::KeyValueStore;
use crate::StoreError;

/// Defines how a view call interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a fresh entry is present;
    /// otherwise fetch from the network and write the response. (Default)
    #[default]
    Use,
    /// Drop any cached entry, then fetch and write the new response.
    Refresh,
    /// Fetch from the network without reading or writing the cache.
    Bypass,
}

/// Stored value: the raw payload and when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Unix epoch milliseconds.
    pub timestamp: u64,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: now_millis(),
        }
    }

    pub fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.timestamp))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(CacheEntry),
    Stale(CacheEntry),
    Miss,
}

/// Payload cache over an injectable [`KeyValueStore`].
#[derive(Clone)]
pub struct ResourceCache {
    store: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl ResourceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A zero timeout means every entry is stale on arrival.
    pub fn is_disabled(&self) -> bool {
        self.timeout.is_zero()
    }

    /// Entries that fail to decode are removed and reported as a miss.
    pub async fn lookup(&self, key: &str) -> Result<CacheLookup, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(CacheLookup::Miss);
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(error) => {
                debug!(key, %error, "discarding undecodable cache entry");
                self.store.delete(key).await?;
                return Ok(CacheLookup::Miss);
            }
        };

        if entry.age(now_millis()) < self.timeout {
            Ok(CacheLookup::Fresh(entry))
        } else {
            Ok(CacheLookup::Stale(entry))
        }
    }

    pub async fn put(&self, key: &str, data: Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&CacheEntry::new(data))?;
        self.store.set(key, encoded).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key).await
    }

    /// Deletes every stale or undecodable entry; returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.store.keys().await? {
            match self.lookup(&key).await? {
                CacheLookup::Fresh(_) => {}
                CacheLookup::Stale(_) => {
                    self.store.delete(&key).await?;
                    removed += 1;
                }
                CacheLookup::Miss => removed += 1,
            }
        }
        Ok(removed)
    }
}

pub fn now_millis() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    u64::try_from(nanos / 1_000_000).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn fresh_entry_is_returned() {
        let cache = ResourceCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));

        cache.put("audio_{}", json!([1, 2])).await.expect("put");

        match cache.lookup("audio_{}").await.expect("lookup") {
            CacheLookup::Fresh(entry) => assert_eq!(entry.data, json!([1, 2])),
            other => panic!("expected fresh entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn entry_goes_stale_after_timeout() {
        let cache = ResourceCache::new(Arc::new(MemoryStore::new()), Duration::from_millis(50));

        cache.put("audio_{}", json!([])).await.expect("put");
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(matches!(
            cache.lookup("audio_{}").await.expect("lookup"),
            CacheLookup::Stale(_)
        ));
    }

    #[tokio::test]
    async fn undecodable_entry_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("gallery_{}", String::from("{not json"))
            .await
            .expect("set");
        let cache = ResourceCache::new(store.clone(), Duration::from_secs(60));

        assert_eq!(cache.lookup("gallery_{}").await.expect("lookup"), CacheLookup::Miss);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn purge_removes_only_stale_entries() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResourceCache::new(store.clone(), Duration::from_secs(60));
        let old = CacheEntry {
            data: json!([]),
            timestamp: now_millis() - 120_000,
        };
        store
            .set("audio_{}", serde_json::to_string(&old).expect("encode"))
            .await
            .expect("set");
        cache.put("gallery_{}", json!([])).await.expect("put");

        assert_eq!(cache.purge_expired().await.expect("purge"), 1);
        assert_eq!(store.keys().await.expect("keys"), vec![String::from("gallery_{}")]);
    }

    #[test]
    fn cache_mode_default_is_use() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
