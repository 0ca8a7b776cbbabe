use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entity::Order;
use super::errors::OrderError;
use super::value_objects::{LineItem, OrderId};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
}

impl PlaceOrder {
    pub fn new(customer_id: Uuid, line_items: Vec<LineItem>) -> Self {
        Self {
            customer_id,
            line_items,
        }
    }

    /// Build a fresh order with a generated id, created now.
    pub fn into_order(self) -> Result<Order, OrderError> {
        self.into_order_with(OrderId::generate(), Utc::now())
    }

    pub fn into_order_with(
        self,
        order_id: OrderId,
        created_at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let order = Order {
            order_id,
            customer_id: self.customer_id,
            line_items: self.line_items,
            created_at,
            shipped_at: None,
            completed_at: None,
        };
        order.validate_new()?;

        Ok(order)
    }
}
