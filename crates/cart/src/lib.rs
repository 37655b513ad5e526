//! `vendora-cart` — the per-buyer cart aggregate.

pub mod cart;

pub use cart::{Cart, CartItem};
