//! Application configuration loaded from environment variables.

use std::time::Duration;

use vendora_checkout::CheckoutConfig;
use vendora_infra::{CommitterConfig, RetryPolicy};

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

/// Server + pipeline configuration with the observed production values
/// as defaults.
///
/// Environment variables:
/// - `VENDORA_HOST` / `VENDORA_PORT` — bind address (default `0.0.0.0:8080`)
/// - `RESERVE_MAX_ATTEMPTS` — reservation retry bound (default 3)
/// - `RESERVE_BACKOFF_MS` — linear backoff base in milliseconds (default 100)
/// - `CHECKOUT_TAX_RATE_BP` — flat tax in basis points (default 800 = 8%)
/// - `CHECKOUT_SHIPPING_CENTS` — flat shipping cost (default 0)
/// - `ORDER_NUMBER_ATTEMPTS` — regeneration bound on collision (default 5)
/// - `IDEMPOTENCY_WINDOW_SECS` — replay window for checkout keys (default 6h)
/// - `DATABASE_URL` — switches to the Postgres stores (requires the
///   `postgres` feature)
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub reserve_max_attempts: u32,
    pub reserve_backoff_ms: u64,
    pub tax_rate_basis_points: u64,
    pub shipping_cost_cents: u64,
    pub order_number_attempts: u32,
    pub idempotency_window_secs: u64,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("VENDORA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("VENDORA_PORT", 8080),
            reserve_max_attempts: env_parsed("RESERVE_MAX_ATTEMPTS", 3),
            reserve_backoff_ms: env_parsed("RESERVE_BACKOFF_MS", 100),
            tax_rate_basis_points: env_parsed("CHECKOUT_TAX_RATE_BP", 800),
            shipping_cost_cents: env_parsed("CHECKOUT_SHIPPING_CENTS", 0),
            order_number_attempts: env_parsed("ORDER_NUMBER_ATTEMPTS", 5),
            idempotency_window_secs: env_parsed("IDEMPOTENCY_WINDOW_SECS", 6 * 60 * 60),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.reserve_max_attempts,
            Duration::from_millis(self.reserve_backoff_ms),
        )
    }

    pub fn committer_config(&self) -> CommitterConfig {
        CommitterConfig {
            checkout: CheckoutConfig {
                tax_rate_basis_points: self.tax_rate_basis_points,
                shipping_cost: self.shipping_cost_cents,
            },
            order_number_attempts: self.order_number_attempts,
            idempotency_window: Duration::from_secs(self.idempotency_window_secs),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            reserve_max_attempts: 3,
            reserve_backoff_ms: 100,
            tax_rate_basis_points: 800,
            shipping_cost_cents: 0,
            order_number_attempts: 5,
            idempotency_window_secs: 6 * 60 * 60,
        }
    }
}
