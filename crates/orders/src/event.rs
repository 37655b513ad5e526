use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{BuyerId, OrderId, VendorId};
use vendora_events::Event;

use crate::status::{FulfillmentStatus, OrderStatus};

/// Event: an order was committed (stock reserved, order persisted, cart
/// cleared).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub buyer_id: BuyerId,
    pub vendor_ids: Vec<VendorId>,
    /// Grand total in smallest currency unit (cents).
    pub total: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a fulfillment status changed (vendor sub-order or whole-order
/// cancellation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdated {
    pub order_id: OrderId,
    /// `None` for order-level entries (whole-order cancellation).
    pub vendor_id: Option<VendorId>,
    pub status: FulfillmentStatus,
    /// The derived overall status after this update.
    pub order_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    Placed(OrderPlaced),
    StatusUpdated(OrderStatusUpdated),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "order.placed",
            OrderEvent::StatusUpdated(_) => "order.status_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.occurred_at,
            OrderEvent::StatusUpdated(e) => e.occurred_at,
        }
    }
}
