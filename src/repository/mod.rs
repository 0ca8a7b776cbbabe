// ============================================================================
// Order Repository
// ============================================================================
//
// Maps Order entities onto a KeyValueStore: one record per order plus a single
// ordered index used for paginated listing.
//
// ============================================================================

pub mod errors;
pub mod order_repository;

pub use errors::RepositoryError;
pub use order_repository::{
    record_key, FindAllPage, OrderPage, OrderRepository, DEFAULT_PAGE_SIZE, ORDER_INDEX,
    ORDER_SEQUENCE_KEY,
};
