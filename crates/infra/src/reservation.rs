//! Stock reservation: the concurrency-critical unit of the pipeline.
//!
//! Reserving is read → decide (pure, in `vendora-catalog`) → conditional
//! write. A lost conditional write means another buyer touched the same
//! product between our read and our write; only that case is retried,
//! with linear backoff, up to the configured bound. Insufficiency is
//! never retried (more attempts will not create inventory).

use std::time::Duration;

use thiserror::Error;

use vendora_catalog::{ProductStatus, StockError};
use vendora_core::{ExpectedVersion, ProductId};

use crate::store::{CatalogStore, StoreError};

/// Bounded retry with linear backoff for lost conditional writes.
///
/// Both knobs are configuration (wired from the environment at the
/// binary edge), not constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base backoff; attempt `n` sleeps `n × backoff` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

/// A successfully applied stock reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub quantity: i64,
    pub new_stock: i64,
    pub new_status: ProductStatus,
}

/// Failure of a reservation attempt.
///
/// `Exhausted` (retries spent on conflicts) is deliberately distinct
/// from `Insufficient`: the former is transient, the latter is not.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("requested quantity must be at least 1")]
    InvalidQuantity,

    #[error("product {product_id} not found")]
    NotFound { product_id: ProductId },

    #[error("product '{name}' is not available for ordering")]
    Unavailable { product_id: ProductId, name: String },

    #[error("insufficient stock for '{name}': {available} available")]
    Insufficient {
        product_id: ProductId,
        name: String,
        available: i64,
    },

    #[error("reservation for product {product_id} lost {attempts} conditional writes")]
    Exhausted { product_id: ProductId, attempts: u32 },

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Atomically verifies and decrements product stock.
///
/// This is the **only** component allowed to write `quantity_in_stock`.
/// Concurrent reservations against the same product can never
/// over-commit below zero: each write is conditional on the version the
/// stock figure was read at. No ordering between competing buyers is
/// guaranteed.
#[derive(Debug)]
pub struct StockReservationManager<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S> StockReservationManager<S> {
    pub fn new(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<S: CatalogStore> StockReservationManager<S> {
    /// Reserve `quantity` units of a product.
    ///
    /// On success the store already holds the decremented stock, the
    /// recomputed status and the bumped sales counter.
    pub fn reserve(&self, product_id: ProductId, quantity: i64) -> Result<Reservation, ReserveError> {
        if quantity < 1 {
            return Err(ReserveError::InvalidQuantity);
        }

        for attempt in 1..=self.policy.max_attempts {
            let stored = self
                .store
                .get(product_id)
                .map_err(|e| ReserveError::Storage(e.to_string()))?
                .ok_or(ReserveError::NotFound { product_id })?;

            let decided = stored.product.reserve(quantity).map_err(|e| match e {
                StockError::InvalidQuantity => ReserveError::InvalidQuantity,
                StockError::Unavailable => ReserveError::Unavailable {
                    product_id,
                    name: stored.product.name().to_string(),
                },
                StockError::Insufficient { available } => ReserveError::Insufficient {
                    product_id,
                    name: stored.product.name().to_string(),
                    available,
                },
            })?;

            match self
                .store
                .update(ExpectedVersion::Exact(stored.version), decided)
            {
                Ok(updated) => {
                    tracing::debug!(
                        product_id = %product_id,
                        quantity,
                        new_stock = updated.product.quantity_in_stock(),
                        attempt,
                        "stock reserved"
                    );
                    return Ok(Reservation {
                        product_id,
                        quantity,
                        new_stock: updated.product.quantity_in_stock(),
                        new_status: updated.product.status(),
                    });
                }
                Err(StoreError::Concurrency(reason)) => {
                    tracing::debug!(
                        product_id = %product_id,
                        attempt,
                        %reason,
                        "reservation lost conditional write"
                    );
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.backoff_for(attempt));
                    }
                }
                Err(e) => return Err(ReserveError::Storage(e.to_string())),
            }
        }

        Err(ReserveError::Exhausted {
            product_id,
            attempts: self.policy.max_attempts,
        })
    }

    /// Undo a reservation (commit rollback): restore the stock and sales
    /// counter under the same conditional-write discipline.
    pub fn release(&self, reservation: &Reservation) -> Result<(), ReserveError> {
        let product_id = reservation.product_id;

        for attempt in 1..=self.policy.max_attempts {
            let stored = self
                .store
                .get(product_id)
                .map_err(|e| ReserveError::Storage(e.to_string()))?
                .ok_or(ReserveError::NotFound { product_id })?;

            let restored = stored.product.release(reservation.quantity);

            match self
                .store
                .update(ExpectedVersion::Exact(stored.version), restored)
            {
                Ok(updated) => {
                    tracing::debug!(
                        product_id = %product_id,
                        quantity = reservation.quantity,
                        new_stock = updated.product.quantity_in_stock(),
                        "stock released"
                    );
                    return Ok(());
                }
                Err(StoreError::Concurrency(_)) => {
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.backoff_for(attempt));
                    }
                }
                Err(e) => return Err(ReserveError::Storage(e.to_string())),
            }
        }

        Err(ReserveError::Exhausted {
            product_id,
            attempts: self.policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vendora_catalog::{CatalogCode, Product};
    use vendora_core::VendorId;

    use crate::store::InMemoryCatalogStore;

    fn seeded_store(stock: i64) -> (Arc<InMemoryCatalogStore>, ProductId) {
        let store = Arc::new(InMemoryCatalogStore::new());
        let product = Product::new(
            ProductId::new(),
            VendorId::new(),
            "Acme Wholesale",
            CatalogCode::parse("0002-1433-80").unwrap(),
            "Amoxicillin 500mg",
            1000,
            stock,
        )
        .unwrap();
        let id = product.id_typed();
        store.insert(product).unwrap();
        (store, id)
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn reserve_decrements_stock_in_the_store() {
        let (store, id) = seeded_store(5);
        let manager = StockReservationManager::new(store.clone(), fast_policy(3));

        let reservation = manager.reserve(id, 3).unwrap();
        assert_eq!(reservation.new_stock, 2);
        assert_eq!(reservation.new_status, ProductStatus::Active);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.product.quantity_in_stock(), 2);
        assert_eq!(stored.product.units_sold(), 3);
    }

    #[test]
    fn reserving_everything_flips_status() {
        let (store, id) = seeded_store(2);
        let manager = StockReservationManager::new(store, fast_policy(3));

        let reservation = manager.reserve(id, 2).unwrap();
        assert_eq!(reservation.new_stock, 0);
        assert_eq!(reservation.new_status, ProductStatus::OutOfStock);
    }

    #[test]
    fn insufficiency_is_immediate_and_carries_availability() {
        let (store, id) = seeded_store(2);
        let manager = StockReservationManager::new(store, fast_policy(3));

        let err = manager.reserve(id, 3).unwrap_err();
        match err {
            ReserveError::Insufficient { available, .. } => assert_eq!(available, 2),
            other => panic!("expected Insufficient, got {other:?}"),
        }
    }

    #[test]
    fn unknown_product_is_not_found() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let manager = StockReservationManager::new(store, fast_policy(3));
        let err = manager.reserve(ProductId::new(), 1).unwrap_err();
        assert!(matches!(err, ReserveError::NotFound { .. }));
    }

    #[test]
    fn zero_quantity_is_rejected_before_touching_the_store() {
        let (store, id) = seeded_store(5);
        let manager = StockReservationManager::new(store, fast_policy(3));
        let err = manager.reserve(id, 0).unwrap_err();
        assert!(matches!(err, ReserveError::InvalidQuantity));
    }

    #[test]
    fn release_undoes_a_reservation() {
        let (store, id) = seeded_store(1);
        let manager = StockReservationManager::new(store.clone(), fast_policy(3));

        let reservation = manager.reserve(id, 1).unwrap();
        manager.release(&reservation).unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.product.quantity_in_stock(), 1);
        assert_eq!(stored.product.units_sold(), 0);
        assert_eq!(stored.product.status(), ProductStatus::Active);
    }

    #[test]
    fn concurrent_reservations_never_overdraw() {
        // 16 buyers race for 10 units, 2 each: exactly 5 must win.
        let (store, id) = seeded_store(10);
        let manager = Arc::new(StockReservationManager::new(
            store.clone(),
            fast_policy(50),
        ));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = manager.clone();
            handles.push(std::thread::spawn(move || manager.reserve(id, 2)));
        }

        let mut accepted = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => accepted += 1,
                Err(ReserveError::Insufficient { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected failure: {other:?}"),
            }
        }

        assert_eq!(accepted, 5);
        assert_eq!(insufficient, 11);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.product.quantity_in_stock(), 0);
        assert_eq!(stored.product.units_sold(), 10);
        assert_eq!(stored.product.status(), ProductStatus::OutOfStock);
    }
}
