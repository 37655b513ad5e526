use thiserror::Error;

use vendora_core::ProductId;

/// Typed failure of the checkout pipeline (assembly or commit).
///
/// Insufficiency is enriched with the offending product's name and
/// current availability for user display; everything else propagates
/// untransformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("unknown product {product_id}")]
    UnknownProduct { product_id: ProductId },

    #[error("product '{name}' is not available for ordering")]
    ProductUnavailable { product_id: ProductId, name: String },

    #[error("insufficient stock for '{name}': {available} available")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i64,
    },

    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Transient commit-level conflict; the caller may retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),

    /// The order was persisted but publication to the bus failed.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl CheckoutError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
