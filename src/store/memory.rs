//! In-memory store backend.
//!
//! Keeps records, sorted indexes and counters in process memory behind a
//! single lock, so grouped operations are trivially all-or-nothing. Useful for
//! tests and local demos where persistence is not required.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{KeyValueStore, StoreError, StoreOp};

#[derive(Default)]
struct SortedIndex {
    scores: HashMap<String, u64>,
    ordered: BTreeSet<(u64, String)>,
}

impl SortedIndex {
    fn add(&mut self, member: &str, score: u64) {
        if let Some(old) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(old, member.to_string()));
        }
        self.ordered.insert((score, member.to_string()));
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(score, member.to_string()));
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Vec<u8>>,
    indexes: HashMap<String, SortedIndex>,
    counters: HashMap<String, u64>,
}

impl Inner {
    fn apply(&mut self, op: StoreOp) {
        match op {
            StoreOp::Put { key, value } => {
                self.records.insert(key, value);
            }
            StoreOp::Delete { key } => {
                self.records.remove(&key);
            }
            StoreOp::IndexAdd { index, member, score } => {
                self.indexes.entry(index).or_default().add(&member, score);
            }
            StoreOp::IndexRemove { index, member } => {
                if let Some(idx) = self.indexes.get_mut(&index) {
                    idx.remove(&member);
                }
            }
        }
    }
}

/// In-memory implementation of [`KeyValueStore`].
///
/// Clones share the same underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    atomic: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            atomic: true,
        }
    }

    /// A store that reports no grouped-operation support, forcing callers
    /// onto their sequential write path.
    pub fn without_atomic() -> Self {
        Self {
            atomic: false,
            ..Self::new()
        }
    }

    /// Number of records currently stored.
    pub async fn record_count(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Number of members currently in `index`.
    pub async fn index_len(&self, index: &str) -> usize {
        self.inner
            .read()
            .await
            .indexes
            .get(index)
            .map(|idx| idx.scores.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.records.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.records.remove(key).is_some())
    }

    async fn index_add(&self, index: &str, member: &str, score: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.indexes.entry(index.to_string()).or_default().add(member, score);
        Ok(())
    }

    async fn index_remove(&self, index: &str, member: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .indexes
            .get_mut(index)
            .map(|idx| idx.remove(member))
            .unwrap_or(false))
    }

    async fn index_range(
        &self,
        index: &str,
        offset: u64,
        count: u64,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let Some(idx) = inner.indexes.get(index) else {
            return Ok(Vec::new());
        };

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(count).unwrap_or(usize::MAX);

        Ok(idx
            .ordered
            .iter()
            .skip(skip)
            .take(take)
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let counter = inner.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn supports_atomic(&self) -> bool {
        self.atomic
    }

    async fn apply_atomic(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        if !self.atomic {
            return Err(StoreError::Unsupported("apply_atomic"));
        }

        let mut inner = self.inner.write().await;
        for op in ops {
            inner.apply(op);
        }
        Ok(())
    }
}
