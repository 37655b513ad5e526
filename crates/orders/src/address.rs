use serde::{Deserialize, Serialize};

use vendora_core::ValueObject;

/// Shipping destination snapshotted onto the order.
///
/// `phone` is the only optional field; everything else is required and
/// its absence is a field-level validation failure at checkout, never a
/// silent default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Name of the first missing required field, if any.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        let required = [
            ("recipient", &self.recipient),
            ("street", &self.street),
            ("city", &self.city),
            ("region", &self.region),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
    }
}

impl ValueObject for ShippingAddress {}
