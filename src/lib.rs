// ============================================================================
// Redis-backed order store
// ============================================================================
//
// Layers, leaf first:
// - domain     - Order entity and its placed -> shipped -> completed machine
// - store      - KeyValueStore adapter (Redis, in-memory)
// - repository - OrderRepository keeping records and the listing index in step
//
// Ambient pieces: config (env), metrics (Prometheus), utils (caller retries).
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod metrics;
pub mod repository;
pub mod store;
pub mod utils;

pub use config::Config;
pub use domain::order::{LineItem, Order, OrderError, OrderId, OrderStatus, PlaceOrder};
pub use repository::{FindAllPage, OrderPage, OrderRepository, RepositoryError};
pub use store::{KeyValueStore, MemoryStore, RedisStore, StoreError, StoreOp};
