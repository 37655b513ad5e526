//! Fulfillment status updates.
//!
//! Status writes go through the same optimistic-concurrency discipline
//! as stock: load the versioned order record, apply the transition in
//! the domain, conditionally write it back, retry on a lost write.

use thiserror::Error;

use vendora_core::{DomainError, ExpectedVersion, OrderId, VendorId};
use vendora_events::{EventBus, EventEnvelope};
use vendora_orders::{
    ActorKind, FulfillmentStatus, Order, OrderEvent, OrderStatusUpdated, PaymentStatus,
    StatusUpdate,
};

use crate::reservation::RetryPolicy;
use crate::store::{OrderStore, StoreError};

/// A requested status transition.
///
/// `vendor_id` targets one vendor sub-order; omitting it is only legal
/// for a whole-order cancellation.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub vendor_id: Option<VendorId>,
    pub status: FulfillmentStatus,
    pub actor_id: vendora_core::ActorId,
    pub actor_kind: ActorKind,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub note: Option<String>,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("event publication failed: {0}")]
    Publish(String),
}

/// Applies status transitions to persisted orders.
pub struct FulfillmentService<O, B> {
    orders: O,
    bus: B,
    policy: RetryPolicy,
}

impl<O, B> FulfillmentService<O, B>
where
    O: OrderStore,
    B: EventBus<EventEnvelope<serde_json::Value>>,
{
    pub fn new(orders: O, bus: B, policy: RetryPolicy) -> Self {
        Self { orders, bus, policy }
    }

    /// Apply one status transition and return the updated order.
    pub fn update_status(
        &self,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<Order, FulfillmentError> {
        for attempt in 1..=self.policy.max_attempts {
            let stored = self
                .orders
                .get(order_id)
                .map_err(|e| FulfillmentError::Storage(e.to_string()))?
                .ok_or(FulfillmentError::NotFound)?;

            let mut order = stored.order;
            let update = StatusUpdate {
                actor_id: change.actor_id,
                actor_kind: change.actor_kind,
                note: change.note.clone(),
                tracking_number: change.tracking_number.clone(),
                carrier: change.carrier.clone(),
                occurred_at: change.occurred_at,
            };

            match change.vendor_id {
                Some(vendor_id) => {
                    order.update_vendor_status(vendor_id, change.status, update)?;
                }
                None if change.status == FulfillmentStatus::Cancelled => {
                    order.cancel(update)?;
                }
                None => {
                    return Err(DomainError::validation(
                        "vendor_id is required unless cancelling the whole order",
                    )
                    .into());
                }
            }

            match self.orders.update(ExpectedVersion::Exact(stored.version), order) {
                Ok(updated) => {
                    self.publish_updated(&updated.order, &change)?;
                    tracing::info!(
                        order_number = %updated.order.number(),
                        vendor_id = ?change.vendor_id,
                        status = %change.status,
                        order_status = %updated.order.status(),
                        "fulfillment status updated"
                    );
                    return Ok(updated.order);
                }
                Err(StoreError::Concurrency(_)) => {
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.backoff * attempt);
                    }
                }
                Err(e) => return Err(FulfillmentError::Storage(e.to_string())),
            }
        }

        Err(FulfillmentError::Conflict(format!(
            "status update for order {order_id} kept conflicting after {} attempts",
            self.policy.max_attempts
        )))
    }

    /// Replace the payment label (no state machine; label only).
    pub fn set_payment_status(
        &self,
        order_id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, FulfillmentError> {
        for attempt in 1..=self.policy.max_attempts {
            let stored = self
                .orders
                .get(order_id)
                .map_err(|e| FulfillmentError::Storage(e.to_string()))?
                .ok_or(FulfillmentError::NotFound)?;

            let mut order = stored.order;
            order.set_payment_status(status);

            match self.orders.update(ExpectedVersion::Exact(stored.version), order) {
                Ok(updated) => return Ok(updated.order),
                Err(StoreError::Concurrency(_)) => {
                    if attempt < self.policy.max_attempts {
                        std::thread::sleep(self.policy.backoff * attempt);
                    }
                }
                Err(e) => return Err(FulfillmentError::Storage(e.to_string())),
            }
        }

        Err(FulfillmentError::Conflict(format!(
            "payment update for order {order_id} kept conflicting after {} attempts",
            self.policy.max_attempts
        )))
    }

    fn publish_updated(
        &self,
        order: &Order,
        change: &StatusChange,
    ) -> Result<(), FulfillmentError> {
        let event = OrderEvent::StatusUpdated(OrderStatusUpdated {
            order_id: order.id_typed(),
            vendor_id: change.vendor_id,
            status: change.status,
            order_status: order.status(),
            occurred_at: change.occurred_at,
        });
        let envelope = EventEnvelope::from_typed(*order.id_typed().as_uuid(), &event)
            .map_err(|e| FulfillmentError::Publish(e.to_string()))?;
        self.bus
            .publish(envelope)
            .map_err(|e| FulfillmentError::Publish(format!("{e:?}")))
    }
}
