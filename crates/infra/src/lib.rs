//! `vendora-infra` — stores, the stock reservation manager and the
//! transactional commit coordinator.
//!
//! Everything stateful in the order pipeline lives behind the store
//! traits in [`store`]; the only write primitive is an optimistic
//! conditional update, and every mutation of `quantity_in_stock` goes
//! through [`reservation::StockReservationManager`].

pub mod buyers;
pub mod committer;
pub mod fulfillment;
pub mod idempotency;
pub mod reservation;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use buyers::InMemoryBuyerDirectory;
pub use committer::{CheckoutCommitter, CommitterConfig};
pub use fulfillment::{FulfillmentError, FulfillmentService, StatusChange};
pub use idempotency::IdempotencyCache;
pub use reservation::{Reservation, ReserveError, RetryPolicy, StockReservationManager};
pub use store::{
    CartStore, CatalogStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
    OrderStore, StoreError, StoredOrder, StoredProduct,
};
