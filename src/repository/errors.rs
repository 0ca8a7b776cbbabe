use crate::domain::order::{OrderError, OrderId, OrderStatus};
use crate::store::StoreError;

// ============================================================================
// Repository Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error("Cannot move order from {from} to {requested}")]
    InvalidTransition {
        from: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    #[error("Order rejected: {0}")]
    InvalidOrder(OrderError),

    /// Stored bytes under `key` are not a valid order record.
    #[error("Corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl RepositoryError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryError::NotFound(_) => "not_found",
            RepositoryError::InvalidTransition { .. } => "invalid_transition",
            RepositoryError::UnknownStatus(_) => "unknown_status",
            RepositoryError::InvalidOrder(_) => "invalid_order",
            RepositoryError::Corrupt { .. } => "corrupt",
            RepositoryError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Data-integrity or infrastructure failure, as opposed to a condition
    /// the caller is expected to handle.
    pub fn is_system_failure(&self) -> bool {
        matches!(
            self,
            RepositoryError::Corrupt { .. } | RepositoryError::StoreUnavailable(_)
        )
    }
}

impl From<OrderError> for RepositoryError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, requested } => {
                RepositoryError::InvalidTransition { from, requested }
            }
            OrderError::UnknownStatus(status) => RepositoryError::UnknownStatus(status),
            other @ (OrderError::EmptyLineItems
            | OrderError::InvalidQuantity(_)
            | OrderError::NotPlaced(_)
            | OrderError::ImmutableField(_)) => RepositoryError::InvalidOrder(other),
        }
    }
}
