use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move order from {from} to {requested}")]
    InvalidTransition {
        from: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    #[error("Order line items cannot be empty")]
    EmptyLineItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(u32),

    #[error("New order must be placed, found {0}")]
    NotPlaced(OrderStatus),

    #[error("Order field {0} cannot change after placement")]
    ImmutableField(&'static str),
}
