// ============================================================================
// Order Domain - Entity, Status State Machine, Commands
// ============================================================================
//
// This module contains ALL Order-specific business rules:
// - Value objects (OrderId, LineItem, OrderStatus)
// - Entity (Order with the placed -> shipped -> completed transitions)
// - Commands (PlaceOrder)
// - Errors (OrderError enum)
//
// Nothing here performs I/O. Persistence lives in crate::repository.
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod commands;
pub mod errors;

// Re-export for convenience
pub use value_objects::*;
pub use entity::*;
pub use commands::*;
pub use errors::*;
