//! `vendora-catalog` — product records and pure stock arithmetic.
//!
//! The mutation half of stock reservation (conditional writes, retry)
//! lives in `vendora-infra`; this crate only decides what a reservation
//! would do to a single product record.

pub mod product;

pub use product::{CatalogCode, Product, ProductStatus, StockError};
