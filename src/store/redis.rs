use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{KeyValueStore, StoreError, StoreOp};

// ============================================================================
// Redis Store - Production adapter
// ============================================================================
//
// Mapping onto Redis primitives:
// - records  -> plain string keys (SET / GET / DEL)
// - indexes  -> sorted sets (ZADD / ZREM / ZRANGE by rank)
// - counters -> INCR
// - grouped  -> MULTI/EXEC pipeline
//
// The ConnectionManager multiplexes one long-lived connection and reconnects
// on failure; each call works on a cheap clone of it. Every command is bounded
// by `timeout` and a timeout surfaces as StoreError::Timeout.
//
// ============================================================================

#[derive(Clone)]
pub struct RedisStore {
    conn_manager: ConnectionManager,
    timeout: Duration,
    atomic_writes: bool,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("Invalid Redis URL: {e}")))?;

        let conn_manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(timeout.as_millis() as u64))?
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect to Redis: {e}")))?;

        tracing::info!(
            redis_url = %redis_url,
            timeout_ms = timeout.as_millis() as u64,
            "Connected to Redis"
        );

        Ok(Self {
            conn_manager,
            timeout,
            atomic_writes: true,
        })
    }

    /// Enable or disable MULTI/EXEC grouped writes.
    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    async fn bounded<T, F>(&self, command: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::debug!(command = command, error = %e, "Redis command failed");
                Err(StoreError::Unavailable(format!("{command}: {e}")))
            }
            Err(_) => {
                tracing::debug!(
                    command = command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(StoreError::Timeout(self.timeout.as_millis() as u64))
            }
        }
    }
}

/// Translate a rank window into inclusive ZRANGE bounds.
fn rank_bounds(offset: u64, count: u64) -> Option<(isize, isize)> {
    if count == 0 {
        return None;
    }
    let start = isize::try_from(offset).ok()?;
    let stop = offset
        .checked_add(count - 1)
        .and_then(|stop| isize::try_from(stop).ok())
        .unwrap_or(isize::MAX);
    Some((start, stop))
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut conn = self.conn_manager.clone();
        self.bounded("SET", async move { conn.set::<_, _, ()>(key, value).await })
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn_manager.clone();
        self.bounded("GET", async move { conn.get::<_, Option<Vec<u8>>>(key).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn_manager.clone();
        let removed: i64 = self
            .bounded("DEL", async move { conn.del::<_, i64>(key).await })
            .await?;
        Ok(removed > 0)
    }

    async fn index_add(&self, index: &str, member: &str, score: u64) -> Result<(), StoreError> {
        let mut conn = self.conn_manager.clone();
        self.bounded("ZADD", async move {
            conn.zadd::<_, _, _, ()>(index, member, score).await
        })
        .await
    }

    async fn index_remove(&self, index: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn_manager.clone();
        let removed: i64 = self
            .bounded("ZREM", async move { conn.zrem::<_, _, i64>(index, member).await })
            .await?;
        Ok(removed > 0)
    }

    async fn index_range(
        &self,
        index: &str,
        offset: u64,
        count: u64,
    ) -> Result<Vec<String>, StoreError> {
        let Some((start, stop)) = rank_bounds(offset, count) else {
            return Ok(Vec::new());
        };

        let mut conn = self.conn_manager.clone();
        self.bounded("ZRANGE", async move {
            conn.zrange::<_, Vec<String>>(index, start, stop).await
        })
        .await
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn_manager.clone();
        self.bounded("INCR", async move { conn.incr::<_, _, u64>(key, 1u64).await })
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn_manager.clone();
        let pong: String = self
            .bounded("PING", async move {
                ::redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;

        if pong != "PONG" {
            return Err(StoreError::Unavailable(format!("Unexpected PING reply: {pong}")));
        }
        Ok(())
    }

    fn supports_atomic(&self) -> bool {
        self.atomic_writes
    }

    async fn apply_atomic(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        if !self.atomic_writes {
            return Err(StoreError::Unsupported("apply_atomic"));
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in &ops {
            match op {
                StoreOp::Put { key, value } => {
                    pipe.set(key, value.as_slice()).ignore();
                }
                StoreOp::Delete { key } => {
                    pipe.del(key).ignore();
                }
                StoreOp::IndexAdd { index, member, score } => {
                    pipe.zadd(index, member, *score).ignore();
                }
                StoreOp::IndexRemove { index, member } => {
                    pipe.zrem(index, member).ignore();
                }
            }
        }

        let mut conn = self.conn_manager.clone();
        self.bounded("MULTI/EXEC", async move { pipe.query_async::<()>(&mut conn).await })
            .await
    }
}
