//! Configuration for the order service.
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,
    /// Upper bound on every store call
    pub store_timeout: Duration,
    /// Use MULTI/EXEC for the insert's record + index write
    pub atomic_writes: bool,
    /// Page size when a listing request does not give one
    pub page_size: u64,
    /// Port of the Prometheus exporter
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_timeout: Duration::from_millis(2000),
            atomic_writes: true,
            page_size: 50,
            metrics_port: 9090,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to [`Config::default`]; set but unparseable
    /// values are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let store_timeout_ms: u64 = parse_var(&lookup, "STORE_TIMEOUT_MS")?
            .unwrap_or(defaults.store_timeout.as_millis() as u64);
        let page_size: u64 = parse_var(&lookup, "ORDERS_PAGE_SIZE")?.unwrap_or(defaults.page_size);

        if store_timeout_ms == 0 {
            anyhow::bail!("STORE_TIMEOUT_MS must be greater than zero");
        }
        if page_size == 0 {
            anyhow::bail!("ORDERS_PAGE_SIZE must be greater than zero");
        }

        Ok(Self {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            store_timeout: Duration::from_millis(store_timeout_ms),
            atomic_writes: parse_var(&lookup, "STORE_ATOMIC_WRITES")?
                .unwrap_or(defaults.atomic_writes),
            page_size,
            metrics_port: parse_var(&lookup, "METRICS_PORT")?.unwrap_or(defaults.metrics_port),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {name}: {raw:?}"))
        })
        .transpose()
}
