use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{ActorId, VendorId};

/// Fulfillment status of a vendor sub-order.
///
/// Forward transitions may skip states; regressing to an earlier state is
/// rejected. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Confirmed,
    Processing,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position in the forward progression. `Cancelled` sits outside the
    /// progression and is only comparable through `can_transition_to`.
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Processing => 2,
            Self::Packed => 3,
            Self::Shipped => 4,
            Self::Delivered => 5,
            Self::Cancelled => 6,
        }
    }

    /// Transition legality: any forward move (skips allowed) or a cancel
    /// from a non-terminal state.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Cancelled {
            return true;
        }
        next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Packed => "packed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "processing" => Some(Self::Processing),
            "packed" => Some(Self::Packed),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl core::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall order status, derived from the vendor sub-order statuses.
///
/// Never written directly: recomputed after every sub-order update, so it
/// cannot desynchronize from the sub-orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Packed,
    PartiallyShipped,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Packed => "packed",
            Self::PartiallyShipped => "partially_shipped",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the overall order status from its sub-order statuses.
///
/// - every sub-order cancelled -> cancelled
/// - all remaining delivered -> delivered
/// - all remaining shipped or delivered -> shipped
/// - some remaining shipped or delivered -> partially_shipped
/// - otherwise the least-progressed remaining sub-order
pub fn derive_order_status(statuses: &[FulfillmentStatus]) -> OrderStatus {
    let remaining: Vec<FulfillmentStatus> = statuses
        .iter()
        .copied()
        .filter(|s| *s != FulfillmentStatus::Cancelled)
        .collect();

    if remaining.is_empty() {
        return OrderStatus::Cancelled;
    }

    let shipped_or_later = |s: &FulfillmentStatus| {
        matches!(s, FulfillmentStatus::Shipped | FulfillmentStatus::Delivered)
    };

    if remaining.iter().all(|s| *s == FulfillmentStatus::Delivered) {
        return OrderStatus::Delivered;
    }
    if remaining.iter().all(shipped_or_later) {
        return OrderStatus::Shipped;
    }
    if remaining.iter().any(shipped_or_later) {
        return OrderStatus::PartiallyShipped;
    }

    let least = remaining
        .iter()
        .copied()
        .min_by_key(|s| s.rank())
        .unwrap_or(FulfillmentStatus::Pending);

    match least {
        FulfillmentStatus::Pending => OrderStatus::Pending,
        FulfillmentStatus::Confirmed => OrderStatus::Confirmed,
        FulfillmentStatus::Processing => OrderStatus::Processing,
        _ => OrderStatus::Packed,
    }
}

/// Who performed a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Buyer,
    Vendor,
    Admin,
    System,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "buyer" => Some(Self::Buyer),
            "vendor" => Some(Self::Vendor),
            "admin" => Some(Self::Admin),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// One append-only entry in an order's status history.
///
/// Entries are written once at transition time and never edited or
/// deleted. `vendor_id` is `None` for order-level entries (creation,
/// whole-order cancellation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub vendor_id: Option<VendorId>,
    pub status: FulfillmentStatus,
    pub actor_id: ActorId,
    pub actor_kind: ActorKind,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Context attached to a status transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub actor_id: ActorId,
    pub actor_kind: ActorKind,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Bare transition context with no note or tracking data.
    pub fn by(actor_id: ActorId, actor_kind: ActorKind, occurred_at: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            actor_kind,
            note: None,
            tracking_number: None,
            carrier: None,
            occurred_at,
        }
    }
}
