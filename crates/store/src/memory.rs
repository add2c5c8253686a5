use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::chain::FallbackSlot;
use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// In-memory layer of a store chain.
///
/// Local operations cannot fail; every `StoreError` surfaced by this type
/// originates in a downstream layer. Access to the local mapping is
/// serialized internally with an async `RwLock`, so concurrent callers are
/// safe per layer; the lock is released before any fallback delegation, so
/// the local mutation of a `set`/`remove` is visible before the write
/// travels downstream.
pub struct InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    id: Uuid,
    entries: RwLock<HashMap<String, V>>,
    fallback: FallbackSlot<V>,
}

impl<V> InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty store with no fallback attached.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: RwLock::new(HashMap::new()),
            fallback: FallbackSlot::new(),
        }
    }
}

impl<V> Default for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> KeyValueStore<V> for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        if let Some(value) = self.entries.read().await.get(key).cloned() {
            return Ok(Some(value));
        }
        if let Some(fb) = self.fallback.current().await {
            let found = fb.get(key).await?;
            if let Some(value) = &found {
                self.entries.write().await.insert(key.to_owned(), value.clone());
                debug!(%key, "warmed local layer from fallback");
            }
            return Ok(found);
        }
        Ok(None)
    }

    async fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        if self.entries.read().await.contains_key(key) {
            return Ok(true);
        }
        if let Some(fb) = self.fallback.current().await {
            return fb.contains_key(key).await;
        }
        Ok(false)
    }

    async fn set(&self, key: &str, value: V) -> Result<Option<V>, StoreError> {
        let mut map = self.entries.write().await;
        let previous = map.insert(key.to_owned(), value.clone());
        drop(map);
        if let Some(fb) = self.fallback.current().await {
            let downstream_previous = fb.set(key, value).await?;
            if previous.is_none() {
                return Ok(downstream_previous);
            }
        }
        Ok(previous)
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut map = self.entries.write().await;
        let mut removed = map.remove(key).is_some();
        drop(map);
        if let Some(fb) = self.fallback.current().await {
            removed &= fb.remove(key).await?;
        }
        Ok(removed)
    }

    async fn remove_all(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        if let Some(fb) = self.fallback.current().await {
            fb.remove_all().await?;
        }
        Ok(())
    }

    async fn set_fallback(&self, fallback: Arc<dyn KeyValueStore<V>>) -> Result<(), StoreError> {
        self.fallback.attach(self.id, fallback).await
    }

    async fn fallback(&self) -> Option<Arc<dyn KeyValueStore<V>>> {
        self.fallback.current().await
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn list_keys(&self) -> Result<HashSet<String>, StoreError> {
        let mut keys: HashSet<String> = self.entries.read().await.keys().cloned().collect();
        if let Some(fb) = self.fallback.current().await {
            keys.extend(fb.list_keys().await?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn standalone_store_crud() -> Result<(), anyhow::Error> {
        let store = InMemoryStore::<String>::new();

        // empty store misses without error
        assert_eq!(store.get("a").await?, None);
        assert!(!store.contains_key("a").await?);

        // first set reports no previous value, overwrite reports the old one
        assert_eq!(store.set("a", "1".into()).await?, None);
        assert_eq!(store.set("a", "2".into()).await?, Some("1".into()));
        assert_eq!(store.get("a").await?, Some("2".into()));

        // remove reports presence and is not sticky
        assert!(store.remove("a").await?);
        assert!(!store.remove("a").await?);
        Ok(())
    }

    #[tokio::test]
    async fn get_or_returns_default_on_miss_only() -> Result<(), anyhow::Error> {
        let store = InMemoryStore::<i64>::new();
        assert_eq!(store.get_or("missing", 42).await?, 42);

        store.set("present", 7).await?;
        assert_eq!(store.get_or("present", 42).await?, 7);

        // a stored value equal to the default is still a hit, not a miss
        store.set("same-as-default", 42).await?;
        assert_eq!(store.get_or("same-as-default", 42).await?, 42);
        assert!(store.contains_key("same-as-default").await?);
        Ok(())
    }

    #[tokio::test]
    async fn heterogeneous_payloads_via_json_value() -> Result<(), anyhow::Error> {
        let store = InMemoryStore::<serde_json::Value>::new();
        store.set("num", serde_json::json!(1)).await?;
        store.set("obj", serde_json::json!({"nested": true})).await?;
        assert_eq!(store.get("num").await?, Some(serde_json::json!(1)));
        assert_eq!(store.list_keys().await?.len(), 2);
        Ok(())
    }
}
