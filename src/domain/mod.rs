// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure domain types and rules, independent of the key-value store.
//
// ============================================================================

pub mod order;
