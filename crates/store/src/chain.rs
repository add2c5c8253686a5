use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Holder for a store's optional downstream layer.
///
/// Every layer embeds one of these; it owns the wiring rules so the chain
/// semantics live in exactly one place. The slot is only ever read for
/// delegation or replaced wholesale, never mutated through.
pub struct FallbackSlot<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: RwLock<Option<Arc<dyn KeyValueStore<V>>>>,
}

impl<V> FallbackSlot<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { inner: RwLock::new(None) }
    }

    /// Snapshot of the attached store, if any.
    pub async fn current(&self) -> Option<Arc<dyn KeyValueStore<V>>> {
        self.inner.read().await.clone()
    }

    /// Attach or replace the downstream store for the layer identified by
    /// `owner`.
    ///
    /// Walks the candidate's chain first: if `owner` is reachable (the
    /// candidate itself included), the attach would close a cycle and is
    /// rejected without touching the existing wiring. Wiring is expected at
    /// composition time; attaching concurrently with chain mutation is not
    /// supported.
    pub async fn attach(
        &self,
        owner: Uuid,
        candidate: Arc<dyn KeyValueStore<V>>,
    ) -> Result<(), StoreError> {
        let mut cursor = Some(candidate.clone());
        while let Some(node) = cursor {
            if node.id() == owner {
                warn!(%owner, "fallback wiring rejected: owner reachable from candidate chain");
                return Err(StoreError::CyclicFallback(owner));
            }
            cursor = node.fallback().await;
        }
        debug!(%owner, fallback = %candidate.id(), "fallback attached");
        *self.inner.write().await = Some(candidate);
        Ok(())
    }
}

impl<V> Default for FallbackSlot<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
