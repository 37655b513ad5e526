use std::sync::Arc;

use serde::{Deserialize, Serialize};

use vendora_core::{AddressId, BuyerId};
use vendora_orders::ShippingAddress;

/// A shipping address the buyer has saved for reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: AddressId,
    pub label: Option<String>,
    pub address: ShippingAddress,
}

/// The slice of a buyer's profile checkout needs: identity snapshot
/// fields and address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub buyer_id: BuyerId,
    pub name: String,
    pub email: String,
    pub default_address: Option<ShippingAddress>,
    pub saved_addresses: Vec<SavedAddress>,
}

impl BuyerProfile {
    pub fn saved_address(&self, id: AddressId) -> Option<&ShippingAddress> {
        self.saved_addresses
            .iter()
            .find(|s| s.id == id)
            .map(|s| &s.address)
    }
}

/// Buyer profile/address lookup. Implemented elsewhere (vendor
/// registration and profile management are out of scope); checkout only
/// reads through this seam.
pub trait BuyerDirectory: Send + Sync {
    fn profile(&self, buyer_id: BuyerId) -> Option<BuyerProfile>;
}

impl<D> BuyerDirectory for Arc<D>
where
    D: BuyerDirectory + ?Sized,
{
    fn profile(&self, buyer_id: BuyerId) -> Option<BuyerProfile> {
        (**self).profile(buyer_id)
    }
}
