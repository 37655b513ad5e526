//! In-memory buyer directory.
//!
//! Buyer registration and profile management live outside this system;
//! this implementation backs tests, dev and the seeding surface.

use std::collections::HashMap;
use std::sync::RwLock;

use vendora_checkout::{BuyerDirectory, BuyerProfile};
use vendora_core::BuyerId;

#[derive(Debug, Default)]
pub struct InMemoryBuyerDirectory {
    profiles: RwLock<HashMap<BuyerId, BuyerProfile>>,
}

impl InMemoryBuyerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, profile: BuyerProfile) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(profile.buyer_id, profile);
        }
    }
}

impl BuyerDirectory for InMemoryBuyerDirectory {
    fn profile(&self, buyer_id: BuyerId) -> Option<BuyerProfile> {
        self.profiles
            .read()
            .ok()
            .and_then(|profiles| profiles.get(&buyer_id).cloned())
    }
}
