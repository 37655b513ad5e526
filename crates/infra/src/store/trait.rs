use std::sync::Arc;

use thiserror::Error;

use vendora_cart::Cart;
use vendora_catalog::Product;
use vendora_core::{BuyerId, ExpectedVersion, OrderId, ProductId};
use vendora_orders::{Order, OrderNumber};

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, uniqueness)
/// as opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional write lost: the stored version moved since the
    /// caller read the record.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// A uniqueness constraint was violated on insert.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// The targeted record does not exist.
    #[error("record not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

/// A catalog record together with its store version.
///
/// The version is the optimistic-concurrency token: a conditional write
/// must name the version it read, and fails if the stored one moved.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub product: Product,
    pub version: u64,
}

/// An order record together with its store version.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order: Order,
    pub version: u64,
}

/// Versioned product records with a compare-and-swap write primitive.
///
/// `quantity_in_stock` is the only shared mutable resource in the core;
/// implementations must make `update` atomic with respect to concurrent
/// updates of the **same** product. Writes to different products are
/// independent.
pub trait CatalogStore: Send + Sync {
    /// Insert a new product. Enforces catalog-code uniqueness.
    fn insert(&self, product: Product) -> Result<StoredProduct, StoreError>;

    fn get(&self, product_id: ProductId) -> Result<Option<StoredProduct>, StoreError>;

    fn list(&self) -> Result<Vec<StoredProduct>, StoreError>;

    /// Conditionally replace a product record.
    ///
    /// Fails with [`StoreError::Concurrency`] if the stored version does
    /// not satisfy `expected`. On success the version advances by one.
    fn update(
        &self,
        expected: ExpectedVersion,
        product: Product,
    ) -> Result<StoredProduct, StoreError>;
}

/// Versioned order records. Inserts enforce order-number uniqueness (the
/// commit path regenerates on collision).
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order) -> Result<StoredOrder, StoreError>;

    fn get(&self, order_id: OrderId) -> Result<Option<StoredOrder>, StoreError>;

    fn get_by_number(&self, number: &OrderNumber) -> Result<Option<StoredOrder>, StoreError>;

    fn list_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<StoredOrder>, StoreError>;

    /// Conditionally replace an order record (status updates only; the
    /// identity and line items never change after insert).
    fn update(&self, expected: ExpectedVersion, order: Order) -> Result<StoredOrder, StoreError>;
}

/// Cart persistence. One cart per buyer, never contended (the cart has
/// exactly one owner), so no version token is needed.
pub trait CartStore: Send + Sync {
    fn get(&self, buyer_id: BuyerId) -> Result<Option<Cart>, StoreError>;

    fn put(&self, cart: Cart) -> Result<(), StoreError>;

    fn clear(&self, buyer_id: BuyerId) -> Result<(), StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn insert(&self, product: Product) -> Result<StoredProduct, StoreError> {
        (**self).insert(product)
    }

    fn get(&self, product_id: ProductId) -> Result<Option<StoredProduct>, StoreError> {
        (**self).get(product_id)
    }

    fn list(&self) -> Result<Vec<StoredProduct>, StoreError> {
        (**self).list()
    }

    fn update(
        &self,
        expected: ExpectedVersion,
        product: Product,
    ) -> Result<StoredProduct, StoreError> {
        (**self).update(expected, product)
    }
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert(&self, order: Order) -> Result<StoredOrder, StoreError> {
        (**self).insert(order)
    }

    fn get(&self, order_id: OrderId) -> Result<Option<StoredOrder>, StoreError> {
        (**self).get(order_id)
    }

    fn get_by_number(&self, number: &OrderNumber) -> Result<Option<StoredOrder>, StoreError> {
        (**self).get_by_number(number)
    }

    fn list_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<StoredOrder>, StoreError> {
        (**self).list_by_buyer(buyer_id)
    }

    fn update(&self, expected: ExpectedVersion, order: Order) -> Result<StoredOrder, StoreError> {
        (**self).update(expected, order)
    }
}

impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    fn get(&self, buyer_id: BuyerId) -> Result<Option<Cart>, StoreError> {
        (**self).get(buyer_id)
    }

    fn put(&self, cart: Cart) -> Result<(), StoreError> {
        (**self).put(cart)
    }

    fn clear(&self, buyer_id: BuyerId) -> Result<(), StoreError> {
        (**self).clear(buyer_id)
    }
}
