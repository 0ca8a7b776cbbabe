use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::{LineItem, OrderId, OrderStatus};

// ============================================================================
// Order Entity - Persisted State + Status State Machine
// ============================================================================
//
// placed -> shipped -> completed
//
// Status is never stored directly; it is derived from which timestamps are
// set. Line items, customer and creation time never change after placement.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        match (self.shipped_at, self.completed_at) {
            (_, Some(_)) => OrderStatus::Completed,
            (Some(_), None) => OrderStatus::Shipped,
            (None, None) => OrderStatus::Placed,
        }
    }

    /// Apply a requested status using the current wall clock.
    pub fn apply_status(&mut self, requested: &str) -> Result<OrderStatus, OrderError> {
        self.apply_status_at(requested, Utc::now())
    }

    /// Apply a requested status, stamping the transition with `now`.
    ///
    /// Leaves the order untouched on error.
    pub fn apply_status_at(
        &mut self,
        requested: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderStatus, OrderError> {
        let target = requested.parse::<OrderStatus>()?;

        match target {
            OrderStatus::Shipped => {
                if self.shipped_at.is_some() {
                    return Err(self.invalid_transition(target));
                }
                self.shipped_at = Some(now);
            }
            OrderStatus::Completed => {
                if self.completed_at.is_some() || self.shipped_at.is_none() {
                    return Err(self.invalid_transition(target));
                }
                self.completed_at = Some(now);
            }
            // placed is only ever the initial state
            OrderStatus::Placed => {
                return Err(OrderError::UnknownStatus(requested.to_string()));
            }
        }

        Ok(target)
    }

    /// Rules every order must satisfy when first stored.
    pub fn validate_new(&self) -> Result<(), OrderError> {
        if self.line_items.is_empty() {
            return Err(OrderError::EmptyLineItems);
        }

        if let Some(item) = self.line_items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity(item.quantity));
        }

        match self.status() {
            OrderStatus::Placed => Ok(()),
            other => Err(OrderError::NotPlaced(other)),
        }
    }

    /// Check that `next` may replace this order in storage.
    ///
    /// Customer, line items and creation time are fixed. Timestamps either
    /// stay as they are or advance exactly one step along the lifecycle.
    pub fn check_successor(&self, next: &Order) -> Result<(), OrderError> {
        if next.customer_id != self.customer_id {
            return Err(OrderError::ImmutableField("customer_id"));
        }
        if next.line_items != self.line_items {
            return Err(OrderError::ImmutableField("line_items"));
        }
        if next.created_at != self.created_at {
            return Err(OrderError::ImmutableField("created_at"));
        }

        let unchanged =
            next.shipped_at == self.shipped_at && next.completed_at == self.completed_at;
        let one_step = match self.status() {
            OrderStatus::Placed => next.shipped_at.is_some() && next.completed_at.is_none(),
            OrderStatus::Shipped => {
                next.shipped_at == self.shipped_at && next.completed_at.is_some()
            }
            OrderStatus::Completed => false,
        };

        if unchanged || one_step {
            Ok(())
        } else {
            Err(self.invalid_transition(next.status()))
        }
    }

    fn invalid_transition(&self, requested: OrderStatus) -> OrderError {
        OrderError::InvalidTransition {
            from: self.status(),
            requested,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
