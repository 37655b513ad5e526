use vendora_core::{ActorId, BuyerId};
use vendora_orders::ActorKind;

/// Buyer context for a request.
///
/// The session/authentication gateway in front of this service resolves
/// the caller and forwards the buyer identity in a header; this is the
/// narrow interface the core consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuyerContext {
    buyer_id: BuyerId,
}

impl BuyerContext {
    pub fn new(buyer_id: BuyerId) -> Self {
        Self { buyer_id }
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }
}

/// Actor context for fulfillment-facing requests (vendor/admin side).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: ActorId,
    kind: ActorKind,
}

impl ActorContext {
    pub fn new(actor_id: ActorId, kind: ActorKind) -> Self {
        Self { actor_id, kind }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }
}
