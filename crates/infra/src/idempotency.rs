//! Deduplication of checkout retries.
//!
//! Order creation is not naturally idempotent (each call mints a new
//! order number and reserves stock again), so the committer remembers
//! client-supplied idempotency keys per buyer for a bounded window and
//! replays the original order on a duplicate submission.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use vendora_core::{BuyerId, OrderId};

#[derive(Debug, Clone, Copy)]
struct Entry {
    order_id: OrderId,
    recorded_at: Instant,
}

/// In-memory `(buyer, key) -> order` cache with TTL expiry.
#[derive(Debug)]
pub struct IdempotencyCache {
    ttl: Duration,
    entries: Mutex<HashMap<(BuyerId, String), Entry>>,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a previously recorded checkout for this key.
    pub fn lookup(&self, buyer_id: BuyerId, key: &str) -> Option<OrderId> {
        let mut entries = self.entries.lock().ok()?;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.recorded_at) < self.ttl);
        entries
            .get(&(buyer_id, key.to_string()))
            .map(|entry| entry.order_id)
    }

    /// Remember a committed checkout under its key.
    pub fn record(&self, buyer_id: BuyerId, key: &str, order_id: OrderId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                (buyer_id, key.to_string()),
                Entry {
                    order_id,
                    recorded_at: Instant::now(),
                },
            );
        }
    }
}
