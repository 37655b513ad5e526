//! Versioned record stores for the order pipeline.

mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;
mod r#trait;

pub use in_memory::{InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore};
#[cfg(feature = "postgres")]
pub use postgres::{ensure_schema, PostgresCatalogStore, PostgresOrderStore};
pub use r#trait::{CartStore, CatalogStore, OrderStore, StoreError, StoredOrder, StoredProduct};
