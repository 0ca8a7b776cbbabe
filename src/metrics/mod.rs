// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order repository
// ============================================================================
//
// Provides metrics for:
// - Repository operations (count by outcome, latency)
// - Data-integrity problems (corrupt records, stale index entries)
// - Insert compensation after a partial write
//
// All metrics are registered with a private Prometheus registry and can be
// scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub operations_total: IntCounterVec,
    pub operation_duration: HistogramVec,
    pub corrupt_records: IntCounter,
    pub stale_index_entries: IntCounter,
    pub compensations: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("repository_operations_total", "Order repository operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "repository_operation_duration_seconds",
                "Order repository operation duration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let corrupt_records = IntCounter::new(
            "repository_corrupt_records_total",
            "Stored order records that failed to deserialize",
        )?;
        registry.register(Box::new(corrupt_records.clone()))?;

        let stale_index_entries = IntCounter::new(
            "repository_stale_index_entries_total",
            "Index members found without a matching record",
        )?;
        registry.register(Box::new(stale_index_entries.clone()))?;

        let compensations = IntCounterVec::new(
            Opts::new(
                "repository_compensations_total",
                "Orphaned-record cleanups after a failed index write",
            ),
            &["result"],
        )?;
        registry.register(Box::new(compensations.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_duration,
            corrupt_records,
            stale_index_entries,
            compensations,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.operations_total.with_label_values(&[operation, outcome]).inc();
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    pub fn record_corrupt_record(&self) {
        self.corrupt_records.inc();
    }

    pub fn record_stale_index_entry(&self) {
        self.stale_index_entries.inc();
    }

    /// `cleaned` is false when the orphaned record could not be removed.
    pub fn record_compensation(&self, cleaned: bool) {
        let result = if cleaned { "cleaned" } else { "failed" };
        self.compensations.with_label_values(&[result]).inc();
    }
}
