use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

/// Contract implemented by every layer of a store chain.
///
/// A store holds its own key-value mapping and optionally delegates to one
/// downstream store of the same contract ("fallback"), forming a
/// singly-linked chain: reads consult the local mapping first and warm it
/// from slower layers on a miss; writes go through every layer at write
/// time. Implementations can be in-memory, file-backed, or remote, which is
/// why every operation is async even though a purely local layer never
/// suspends.
///
/// Absent keys are never errors: `get` returns `Ok(None)` and presence
/// checks return `Ok(false)`. Errors are reserved for a layer's own I/O or
/// serialization failures and for rejected wiring.
#[async_trait]
pub trait KeyValueStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Look up a key. A local hit returns immediately without consulting the
    /// fallback; on a local miss the fallback (if any) is queried, and a
    /// value found there is written into the local mapping before being
    /// returned (warm-up).
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// `get` with a caller-supplied default for the all-layers-missed case.
    async fn get_or(&self, key: &str, default: V) -> Result<V, StoreError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Whether the key is present in this layer or any layer below it.
    /// Read-only probe: never warms the local layer.
    async fn contains_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Write a value to this layer and through to every layer below it.
    /// Returns the previous value, preferring the local layer's over the
    /// fallback's when both held one.
    async fn set(&self, key: &str, value: V) -> Result<Option<V>, StoreError>;

    /// Remove a key from this layer and every layer below it. Returns true
    /// only if the key was present at every layer (logical AND), so a key
    /// absent locally but present downstream reports `false`.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Clear this layer and every layer below it.
    async fn remove_all(&self) -> Result<(), StoreError>;

    /// Attach or replace the downstream store. Fails with
    /// [`StoreError::CyclicFallback`] if this store is reachable from the
    /// candidate's own chain; on rejection the existing wiring is untouched.
    async fn set_fallback(&self, fallback: Arc<dyn KeyValueStore<V>>) -> Result<(), StoreError>;

    /// The currently attached downstream store, if any.
    async fn fallback(&self) -> Option<Arc<dyn KeyValueStore<V>>>;

    /// Stable identity of this store instance, used for cycle detection at
    /// wiring time.
    fn id(&self) -> Uuid;

    /// Union of the keys visible at this layer and every layer below it.
    /// A key present in several layers appears once; order is unspecified.
    async fn list_keys(&self) -> Result<HashSet<String>, StoreError>;
}
