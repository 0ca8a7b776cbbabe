use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use redis_orders::metrics::{self, Metrics};
use redis_orders::utils::{retry_on_transient, RetryConfig};
use redis_orders::{
    Config, FindAllPage, KeyValueStore, LineItem, OrderRepository, PlaceOrder, RedisStore,
    StoreError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,redis_orders=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "🚀 Starting Redis order store demo");

    // === 1. Connect to Redis and wait until it answers ===
    let store = retry_on_transient(RetryConfig::startup(), |attempt| {
        let config = config.clone();
        async move {
            tracing::info!(attempt = attempt, "Connecting to Redis...");
            let store = RedisStore::connect(&config.redis_url, config.store_timeout).await?;
            store.ping().await?;
            Ok::<_, StoreError>(store.with_atomic_writes(config.atomic_writes))
        }
    })
    .await
    .into_result()?;

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Build the repository ===
    let repository = OrderRepository::new(Arc::new(store), metrics.clone())
        .with_default_page_size(config.page_size);

    // === 4. Demonstrate full order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let order = repository
        .place(PlaceOrder::new(
            Uuid::new_v4(),
            vec![
                LineItem {
                    item_id: Uuid::new_v4(),
                    quantity: 2,
                    price: 1299,
                },
                LineItem {
                    item_id: Uuid::new_v4(),
                    quantity: 1,
                    price: 4999,
                },
            ],
        ))
        .await?;
    let order_id = order.order_id;
    tracing::info!(order_id = %order_id, "✅ Order placed");

    let page = repository.find_all(FindAllPage::default()).await?;
    tracing::info!(
        listed = page.orders.len(),
        next_cursor = ?page.next_cursor,
        "📋 First page of orders"
    );

    let shipped = repository.update_status(order_id, "shipped").await?;
    tracing::info!(order_id = %order_id, shipped_at = ?shipped.shipped_at, "🚚 Order shipped");

    if let Err(e) = repository.update_status(order_id, "shipped").await {
        tracing::info!(order_id = %order_id, error = %e, "Second shipment rejected as expected");
    }

    let completed = repository.update_status(order_id, "completed").await?;
    tracing::info!(order_id = %order_id, completed_at = ?completed.completed_at, "🏁 Order completed");

    repository.delete_by_id(order_id).await?;
    match repository.find_by_id(order_id).await {
        Err(e) => tracing::info!(order_id = %order_id, error = %e, "Order gone after delete"),
        Ok(_) => tracing::warn!(order_id = %order_id, "Order still readable after delete"),
    }

    tracing::info!("🎉 Demo complete!");

    Ok(())
}
