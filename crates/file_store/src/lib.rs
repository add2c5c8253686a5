//! JSON-file-backed store layer.
//!
//! Persists its mapping as a flat JSON object and rewrites the file after
//! every mutation. Intended as the slower layer under an in-memory store
//! where a database is overkill; it carries its own fallback slot, so it can
//! also sit mid-chain.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use store::{FallbackSlot, KeyValueStore, StoreError};

/// File-backed layer of a store chain.
///
/// The full map is loaded at construction and held in memory; reads never
/// touch the disk, mutations rewrite the whole file before any downstream
/// delegation. Only a missing file starts the store empty: a corrupt one
/// fails construction with [`StoreError::Serialization`] and an unreadable
/// one with [`StoreError::Io`], rather than clobbering existing data.
pub struct JsonFileStore<V>
where
    V: Clone + Send + Sync + serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    id: Uuid,
    file_path: PathBuf,
    entries: RwLock<HashMap<String, V>>,
    fallback: FallbackSlot<V>,
}

impl<V> JsonFileStore<V>
where
    V: Clone + Send + Sync + serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    /// Open the store at the given path. Creates the file with an empty map
    /// (and any missing parent directories) if it does not exist.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<String, V> = HashMap::new();
                let data = serde_json::to_vec(&empty)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                fs::write(&file_path, data).await.map_err(|e| StoreError::Io(e.to_string()))?;
                empty
            }
            // only a missing file starts empty; anything else must not
            // clobber data that may still be there
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            file_path,
            entries: RwLock::new(map),
            fallback: FallbackSlot::new(),
        })
    }

    /// Open the store at the path a [`configs::FileLayerConfig`] resolves to.
    pub async fn from_config(cfg: &configs::FileLayerConfig) -> Result<Self, StoreError> {
        Self::new(cfg.resolved_path()).await
    }

    async fn save(&self) -> Result<(), StoreError> {
        let map = self.entries.read().await;
        let data =
            serde_json::to_vec(&*map).map_err(|e| StoreError::Serialization(e.to_string()))?;
        drop(map);
        fs::write(&self.file_path, data).await.map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<V> KeyValueStore<V> for JsonFileStore<V>
where
    V: Clone + Send + Sync + serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        if let Some(value) = self.entries.read().await.get(key).cloned() {
            return Ok(Some(value));
        }
        if let Some(fb) = self.fallback.current().await {
            let found = fb.get(key).await?;
            if let Some(value) = &found {
                self.entries.write().await.insert(key.to_owned(), value.clone());
                self.save().await?;
                debug!(%key, "warmed file layer from fallback");
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
        self.save().await?;
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
        self.save().await?;
        if let Some(fb) = self.fallback.current().await {
            removed &= fb.remove(key).await?;
        }
        Ok(removed)
    }

    async fn remove_all(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        self.save().await?;
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
