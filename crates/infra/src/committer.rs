//! The transactional commit coordinator.
//!
//! Turns an assembled draft into a persisted order as one all-or-nothing
//! unit of work: every line item's stock is reserved (in the draft's
//! deterministic order), the order is inserted under a freshly generated
//! unique order number, the buyer's cart is cleared and `order.placed`
//! is published. Any reservation failure releases the reservations
//! already taken by this commit, in reverse order, before surfacing the
//! first offending item — no order row, no net stock change, cart
//! untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use vendora_cart::Cart;
use vendora_catalog::Product;
use vendora_checkout::{assemble, BuyerDirectory, CheckoutError, CheckoutRequest, OrderDraft};
use vendora_core::{BuyerId, DomainError, OrderId, ProductId};
use vendora_events::{EventBus, EventEnvelope};
use vendora_orders::{Order, OrderEvent, OrderNumber, OrderPlaced};

use crate::idempotency::IdempotencyCache;
use crate::reservation::{Reservation, ReserveError, RetryPolicy, StockReservationManager};
use crate::store::{CartStore, CatalogStore, OrderStore, StoreError};

pub use vendora_checkout::CheckoutConfig;

/// Commit-side configuration knobs.
#[derive(Debug, Clone, Copy)]
pub struct CommitterConfig {
    pub checkout: CheckoutConfig,
    /// Bound on order-number regeneration when the store reports a
    /// uniqueness collision.
    pub order_number_attempts: u32,
    /// Window within which a repeated idempotency key replays the
    /// original order instead of checking out again.
    pub idempotency_window: std::time::Duration,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self {
            checkout: CheckoutConfig::default(),
            order_number_attempts: 5,
            idempotency_window: std::time::Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Orchestrates cart → draft → reservations → persisted order.
pub struct CheckoutCommitter<C, O, K, D, B> {
    catalog: C,
    orders: O,
    carts: K,
    buyers: D,
    bus: B,
    reservations: StockReservationManager<C>,
    idempotency: IdempotencyCache,
    config: CommitterConfig,
}

impl<C, O, K, D, B> CheckoutCommitter<C, O, K, D, B>
where
    C: CatalogStore + Clone,
    O: OrderStore,
    K: CartStore,
    D: BuyerDirectory,
    B: EventBus<EventEnvelope<serde_json::Value>>,
{
    pub fn new(
        catalog: C,
        orders: O,
        carts: K,
        buyers: D,
        bus: B,
        retry: RetryPolicy,
        config: CommitterConfig,
    ) -> Self {
        let reservations = StockReservationManager::new(catalog.clone(), retry);
        Self {
            catalog,
            orders,
            carts,
            buyers,
            bus,
            reservations,
            idempotency: IdempotencyCache::new(config.idempotency_window),
            config,
        }
    }

    /// Commit the buyer's cart as a new order.
    pub fn commit(
        &self,
        buyer_id: BuyerId,
        request: CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if let Some(order) = self.replay(buyer_id, &request)? {
            return Ok(order);
        }

        let cart = self
            .carts
            .get(buyer_id)
            .map_err(storage)?
            .ok_or(CheckoutError::EmptyCart)?;

        let buyer = self
            .buyers
            .profile(buyer_id)
            .ok_or_else(|| CheckoutError::validation("buyer_id", "unknown buyer"))?;

        let products = self.product_snapshots(&cart)?;
        let draft = assemble(&cart, &buyer, &request, &products, &self.config.checkout)?;

        let reserved = self.reserve_all(&draft)?;

        let order = match self.persist_with_unique_number(draft, now) {
            Ok(order) => order,
            Err(e) => {
                self.rollback(&reserved);
                return Err(e);
            }
        };

        self.carts.clear(buyer_id).map_err(storage)?;

        if let Some(key) = &request.idempotency_key {
            self.idempotency.record(buyer_id, key, order.id_typed());
        }

        self.publish_placed(&order, now)?;

        tracing::info!(
            order_number = %order.number(),
            buyer_id = %buyer_id,
            total = order.total(),
            vendors = order.vendor_orders().len(),
            items = order.items().len(),
            "order committed"
        );

        Ok(order)
    }

    /// A repeated idempotency key returns the originally created order
    /// without touching stock or the cart.
    fn replay(
        &self,
        buyer_id: BuyerId,
        request: &CheckoutRequest,
    ) -> Result<Option<Order>, CheckoutError> {
        let Some(key) = &request.idempotency_key else {
            return Ok(None);
        };
        let Some(order_id) = self.idempotency.lookup(buyer_id, key) else {
            return Ok(None);
        };
        match self.orders.get(order_id).map_err(storage)? {
            Some(stored) => {
                tracing::info!(
                    order_number = %stored.order.number(),
                    buyer_id = %buyer_id,
                    "checkout replayed from idempotency key"
                );
                Ok(Some(stored.order))
            }
            None => Ok(None),
        }
    }

    /// Re-read every carted product. Missing products surface later as
    /// `UnknownProduct` from the assembler.
    fn product_snapshots(&self, cart: &Cart) -> Result<HashMap<ProductId, Product>, CheckoutError> {
        let mut products = HashMap::with_capacity(cart.items().len());
        for line in cart.items() {
            if let Some(stored) = self.catalog.get(line.product_id).map_err(storage)? {
                products.insert(line.product_id, stored.product);
            }
        }
        Ok(products)
    }

    /// Reserve every line in the draft's deterministic order; on failure
    /// release what this commit already took (reverse order) and surface
    /// the offending item.
    fn reserve_all(&self, draft: &OrderDraft) -> Result<Vec<Reservation>, CheckoutError> {
        let mut reserved = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            match self.reservations.reserve(item.product_id, item.quantity) {
                Ok(reservation) => reserved.push(reservation),
                Err(e) => {
                    tracing::warn!(
                        product_id = %item.product_id,
                        error = %e,
                        reserved = reserved.len(),
                        "commit aborted during reservation"
                    );
                    self.rollback(&reserved);
                    return Err(map_reserve_error(e));
                }
            }
        }
        Ok(reserved)
    }

    fn persist_with_unique_number(
        &self,
        draft: OrderDraft,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        let seed = draft.into_seed();

        for _ in 0..self.config.order_number_attempts {
            let number = OrderNumber::generate(&mut rand::thread_rng());
            let order = Order::create(OrderId::new(), number, seed.clone(), now)
                .map_err(map_domain_error)?;

            match self.orders.insert(order) {
                Ok(stored) => return Ok(stored.order),
                Err(StoreError::Duplicate { field, value }) if field == "order_number" => {
                    tracing::warn!(order_number = %value, "order number collision, regenerating");
                }
                Err(e) => return Err(storage(e)),
            }
        }

        Err(CheckoutError::Conflict(format!(
            "could not allocate a unique order number in {} attempts",
            self.config.order_number_attempts
        )))
    }

    fn rollback(&self, reserved: &[Reservation]) {
        for reservation in reserved.iter().rev() {
            if let Err(e) = self.reservations.release(reservation) {
                // The release loop is as patient as the reserve loop; a
                // failure here leaves stock under-counted and needs an
                // operator.
                tracing::error!(
                    product_id = %reservation.product_id,
                    quantity = reservation.quantity,
                    error = %e,
                    "rollback release failed"
                );
            }
        }
    }

    fn publish_placed(&self, order: &Order, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        let event = OrderEvent::Placed(OrderPlaced {
            order_id: order.id_typed(),
            order_number: order.number().to_string(),
            buyer_id: order.buyer_id(),
            vendor_ids: order.vendor_orders().iter().map(|v| v.vendor_id()).collect(),
            total: order.total(),
            occurred_at: now,
        });
        let envelope = EventEnvelope::from_typed(*order.id_typed().as_uuid(), &event)
            .map_err(|e| CheckoutError::Publish(e.to_string()))?;
        self.bus
            .publish(envelope)
            .map_err(|e| CheckoutError::Publish(format!("{e:?}")))
    }
}

fn storage(e: StoreError) -> CheckoutError {
    CheckoutError::Storage(e.to_string())
}

fn map_reserve_error(e: ReserveError) -> CheckoutError {
    match e {
        ReserveError::InvalidQuantity => CheckoutError::validation("quantity", "must be at least 1"),
        ReserveError::NotFound { product_id } => CheckoutError::UnknownProduct { product_id },
        ReserveError::Unavailable { product_id, name } => {
            CheckoutError::ProductUnavailable { product_id, name }
        }
        ReserveError::Insufficient {
            product_id,
            name,
            available,
        } => CheckoutError::InsufficientStock {
            product_id,
            name,
            available,
        },
        ReserveError::Exhausted { product_id, attempts } => CheckoutError::Conflict(format!(
            "reservation for product {product_id} kept conflicting after {attempts} attempts"
        )),
        ReserveError::Storage(msg) => CheckoutError::Storage(msg),
    }
}

fn map_domain_error(e: DomainError) -> CheckoutError {
    match e {
        DomainError::Validation(msg) => CheckoutError::validation("order", msg),
        other => CheckoutError::Storage(format!("order construction failed: {other}")),
    }
}
