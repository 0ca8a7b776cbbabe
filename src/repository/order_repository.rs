use futures_util::future::try_join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::order::{Order, OrderId, PlaceOrder};
use crate::metrics::Metrics;
use crate::store::{KeyValueStore, StoreError, StoreOp};

use super::errors::RepositoryError;

// ============================================================================
// Order Repository - Record + Index persistence
// ============================================================================
//
// Layout in the store:
// - record:  order:<id>  -> JSON-serialized Order
// - index:   orders      -> sorted set, member = <id>, score = insertion sequence
// - counter: orders:seq  -> source of insertion scores
//
// Consistency:
// - Insert writes record and index entry in one grouped operation when the
//   store supports it. Otherwise the record is written first, then the index
//   entry; if the index write fails the record is deleted again before the
//   error is returned. Between the two writes the record exists but is not
//   listed.
// - Readers tolerate index members whose record is gone (stale entries are
//   skipped by FindAll).
// - Insert accepts only new orders: placed, with at least one line item.
// - Update overwrites the record only; the index never changes after insert.
//   The stored record must decode, and the replacement may only advance its
//   status by one step.
// - Delete removes the record, then the index entry.
//
// The repository holds no mutable state of its own and never retries.
//
// ============================================================================

pub const ORDER_INDEX: &str = "orders";
pub const ORDER_SEQUENCE_KEY: &str = "orders:seq";
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Store key holding the serialized order.
pub fn record_key(order_id: OrderId) -> String {
    format!("order:{}", order_id)
}

/// Offset-based page request for [`OrderRepository::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAllPage {
    pub offset: u64,
    /// Zero selects the repository's default page size.
    pub size: u64,
}

impl FindAllPage {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Continue from a cursor returned by a previous page.
    pub fn from_cursor(cursor: u64) -> Self {
        Self {
            offset: cursor,
            size: 0,
        }
    }
}

impl Default for FindAllPage {
    fn default() -> Self {
        Self {
            offset: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Offset of the next page; `None` at the end of the list.
    pub next_cursor: Option<u64>,
}

#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<Metrics>,
    default_page_size: u64,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            metrics,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    /// Validate a PlaceOrder command and insert the resulting order.
    pub async fn place(&self, command: PlaceOrder) -> Result<Order, RepositoryError> {
        let order = command.into_order().map_err(RepositoryError::from)?;
        self.insert(order).await
    }

    pub async fn insert(&self, order: Order) -> Result<Order, RepositoryError> {
        self.observe("insert", self.insert_order(order)).await
    }

    pub async fn find_all(&self, page: FindAllPage) -> Result<OrderPage, RepositoryError> {
        self.observe("find_all", self.find_page(page)).await
    }

    pub async fn find_by_id(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        self.observe("find_by_id", self.load(order_id)).await
    }

    pub async fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        self.observe("update", self.overwrite(order)).await
    }

    /// Load the order, apply the requested status and persist it.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        requested: &str,
    ) -> Result<Order, RepositoryError> {
        self.observe("update_status", self.transition(order_id, requested))
            .await
    }

    pub async fn delete_by_id(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        self.observe("delete_by_id", self.remove(order_id)).await
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    async fn insert_order(&self, order: Order) -> Result<Order, RepositoryError> {
        order.validate_new()?;

        let key = record_key(order.order_id);
        let payload = encode(&key, &order)?;
        let member = order.order_id.to_string();
        let score = self.store.increment(ORDER_SEQUENCE_KEY).await?;

        if self.store.supports_atomic() {
            self.store
                .apply_atomic(vec![
                    StoreOp::Put {
                        key,
                        value: payload,
                    },
                    StoreOp::IndexAdd {
                        index: ORDER_INDEX.to_string(),
                        member,
                        score,
                    },
                ])
                .await?;
        } else {
            // Detached so the cleanup still runs if the caller stops waiting.
            let task = tokio::spawn(write_then_index(
                self.store.clone(),
                self.metrics.clone(),
                key,
                payload,
                member,
                score,
            ));
            task.await.map_err(|e| {
                StoreError::Unavailable(format!("Insert task aborted: {e}"))
            })??;
        }

        tracing::info!(
            order_id = %order.order_id,
            customer_id = %order.customer_id,
            line_items = order.line_items.len(),
            score = score,
            "✅ Order inserted"
        );

        Ok(order)
    }

    async fn transition(
        &self,
        order_id: OrderId,
        requested: &str,
    ) -> Result<Order, RepositoryError> {
        let mut order = self.load(order_id).await?;
        let status = order.apply_status(requested)?;
        self.overwrite(&order).await?;

        tracing::info!(
            order_id = %order_id,
            status = %status,
            "Order status updated"
        );
        Ok(order)
    }

    async fn find_page(&self, page: FindAllPage) -> Result<OrderPage, RepositoryError> {
        let size = if page.size == 0 {
            self.default_page_size
        } else {
            page.size
        };

        // One extra member tells us whether another page exists.
        let mut members = self
            .store
            .index_range(ORDER_INDEX, page.offset, size.saturating_add(1))
            .await?;

        let has_more = members.len() as u64 > size;
        members.truncate(usize::try_from(size).unwrap_or(usize::MAX));

        let mut ids = Vec::with_capacity(members.len());
        for member in &members {
            match member.parse::<OrderId>() {
                Ok(id) => ids.push(id),
                Err(e) => {
                    tracing::warn!(
                        member = %member,
                        error = %e,
                        "Skipping unparseable index member"
                    );
                    self.metrics.record_stale_index_entry();
                }
            }
        }

        let keys: Vec<String> = ids.iter().map(|id| record_key(*id)).collect();
        let records = try_join_all(keys.iter().map(|key| self.store.get(key))).await?;

        let mut orders = Vec::with_capacity(records.len());
        for ((id, key), record) in ids.iter().zip(&keys).zip(records) {
            match record {
                Some(bytes) => orders.push(decode(*id, key, &bytes)?),
                None => {
                    tracing::warn!(order_id = %id, "Skipping stale index entry without record");
                    self.metrics.record_stale_index_entry();
                }
            }
        }

        let next_cursor = has_more.then(|| page.offset.saturating_add(size));

        tracing::debug!(
            offset = page.offset,
            size = size,
            returned = orders.len(),
            next_cursor = ?next_cursor,
            "Listed orders"
        );

        Ok(OrderPage {
            orders,
            next_cursor,
        })
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let key = record_key(order_id);
        match self.store.get(&key).await? {
            Some(bytes) => decode(order_id, &key, &bytes),
            None => Err(RepositoryError::NotFound(order_id)),
        }
    }

    async fn overwrite(&self, order: &Order) -> Result<(), RepositoryError> {
        let key = record_key(order.order_id);
        let payload = encode(&key, order)?;

        // Read-check-write; concurrent updates to one order are last-write-wins.
        let stored = self.load(order.order_id).await?;
        stored.check_successor(order)?;

        self.store.put(&key, payload).await?;

        tracing::debug!(order_id = %order.order_id, status = %order.status(), "Order record overwritten");
        Ok(())
    }

    async fn remove(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let key = record_key(order_id);
        let member = order_id.to_string();

        let existed = self.store.delete(&key).await?;

        let indexed = match self.store.index_remove(ORDER_INDEX, &member).await {
            Ok(indexed) => indexed,
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    record_deleted = existed,
                    error = %e,
                    "Index removal failed; entry left stale"
                );
                return Err(e.into());
            }
        };

        if !existed {
            if indexed {
                tracing::warn!(order_id = %order_id, "Removed stale index entry for missing record");
                self.metrics.record_stale_index_entry();
            }
            return Err(RepositoryError::NotFound(order_id));
        }

        if !indexed {
            tracing::warn!(order_id = %order_id, "Deleted record had no index entry");
        }

        tracing::info!(order_id = %order_id, "🗑️ Order deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Instrumentation
    // ------------------------------------------------------------------------

    async fn observe<T, F>(&self, operation: &'static str, fut: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => {
                self.metrics.record_operation(operation, "ok", elapsed);
            }
            Err(e) => {
                self.metrics.record_operation(operation, e.kind(), elapsed);
                if matches!(e, RepositoryError::Corrupt { .. }) {
                    self.metrics.record_corrupt_record();
                }

                if e.is_system_failure() {
                    tracing::error!(operation = operation, kind = e.kind(), error = %e, "Order repository operation failed");
                } else {
                    tracing::debug!(operation = operation, kind = e.kind(), error = %e, "Order repository operation rejected");
                }
            }
        }

        result
    }
}

/// Sequential insert for stores without grouped writes.
async fn write_then_index(
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<Metrics>,
    key: String,
    payload: Vec<u8>,
    member: String,
    score: u64,
) -> Result<(), StoreError> {
    store.put(&key, payload).await?;

    let index_err = match store.index_add(ORDER_INDEX, &member, score).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    tracing::warn!(
        key = %key,
        error = %index_err,
        "Index write failed after record write; removing orphaned record"
    );

    match store.delete(&key).await {
        Ok(_) => {
            metrics.record_compensation(true);
            tracing::warn!(key = %key, "Orphaned record removed");
        }
        Err(cleanup_err) => {
            metrics.record_compensation(false);
            tracing::error!(
                key = %key,
                error = %cleanup_err,
                "Failed to remove orphaned record; it is stored but not listed"
            );
        }
    }

    Err(index_err)
}

fn encode(key: &str, order: &Order) -> Result<Vec<u8>, RepositoryError> {
    serde_json::to_vec(order).map_err(|e| RepositoryError::Corrupt {
        key: key.to_string(),
        reason: format!("serialization failed: {e}"),
    })
}

fn decode(expected: OrderId, key: &str, bytes: &[u8]) -> Result<Order, RepositoryError> {
    let order: Order = serde_json::from_slice(bytes).map_err(|e| RepositoryError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    if order.order_id != expected {
        return Err(RepositoryError::Corrupt {
            key: key.to_string(),
            reason: format!("record holds order {}", order.order_id),
        });
    }

    Ok(order)
}
