// ============================================================================
// Key-Value Store Adapter
// ============================================================================
//
// Thin capability interface over the backing store:
// - single-key put / get / delete
// - an ordered secondary index (member + score) with range-by-offset
// - a monotonic counter used to score index entries
// - an optional all-or-nothing grouped write
//
// Implementations:
// - redis::RedisStore   - production backend (strings + sorted sets)
// - memory::MemoryStore - in-process backend for tests and local demos
//
// ============================================================================

use async_trait::async_trait;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Errors surfaced by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the command.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured bound.
    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    /// The adapter does not offer the requested capability.
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

/// A single write that can take part in a grouped operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
    IndexAdd { index: String, member: String, score: u64 },
    IndexRemove { index: String, member: String },
}

/// Capabilities the order repository needs from the underlying store.
///
/// Every call is atomic on its own. Implementations must be safe to share
/// across tasks; the repository holds one behind an `Arc`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn index_add(&self, index: &str, member: &str, score: u64) -> Result<(), StoreError>;

    /// Returns whether the member was present.
    async fn index_remove(&self, index: &str, member: &str) -> Result<bool, StoreError>;

    /// Members ordered by ascending score (ties by member), skipping `offset`
    /// and returning at most `count`.
    async fn index_range(
        &self,
        index: &str,
        offset: u64,
        count: u64,
    ) -> Result<Vec<String>, StoreError>;

    /// Atomically increments the counter at `key` and returns the new value.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Liveness check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Whether `apply_atomic` is available.
    fn supports_atomic(&self) -> bool {
        false
    }

    /// Applies all operations as one unit: either every one takes effect or none do.
    async fn apply_atomic(&self, _ops: Vec<StoreOp>) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("apply_atomic"))
    }
}
