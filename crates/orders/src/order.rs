use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{
    BuyerId, DomainError, DomainResult, Entity, OrderId, ProductId, VendorId,
};

use crate::address::ShippingAddress;
use crate::number::OrderNumber;
use crate::status::{
    derive_order_status, ActorKind, FulfillmentStatus, OrderStatus, StatusHistoryEntry,
    StatusUpdate,
};

/// Payment method label chosen at checkout. A label only; capture and
/// settlement happen outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    WireTransfer,
    Check,
}

impl PaymentMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bank_transfer" => Some(Self::BankTransfer),
            "wire_transfer" => Some(Self::WireTransfer),
            "check" => Some(Self::Check),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::WireTransfer => "wire_transfer",
            Self::Check => "check",
        }
    }
}

/// Payment state label (no gateway integration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// One order line. Everything here is snapshotted at order time and
/// never re-derived from the current catalog state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub catalog_code: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub quantity: i64,
    /// Price in smallest currency unit (cents).
    pub unit_price: u64,
    pub line_total: u64,
}

/// The portion of an order attributable to one selling vendor, with its
/// own fulfillment lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOrder {
    vendor_id: VendorId,
    vendor_name: String,
    /// Sum of this vendor's line totals (cents).
    subtotal: u64,
    status: FulfillmentStatus,
    tracking_number: Option<String>,
    carrier: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl VendorOrder {
    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }
}

/// Per-vendor input to `Order::create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorOrderSeed {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub subtotal: u64,
}

/// Everything needed to persist a new order. Produced by the assembler;
/// totals and the vendor partition are re-checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSeed {
    pub buyer_id: BuyerId,
    pub buyer_name: String,
    pub buyer_email: String,
    pub items: Vec<OrderItem>,
    pub vendor_orders: Vec<VendorOrderSeed>,
    pub subtotal: u64,
    pub shipping_cost: u64,
    pub tax: u64,
    pub total: u64,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

/// A persisted multi-vendor order.
///
/// Identity fields and line items are immutable once created; only the
/// status fields (and their history) change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    number: OrderNumber,
    buyer_id: BuyerId,
    buyer_name: String,
    buyer_email: String,
    items: Vec<OrderItem>,
    vendor_orders: Vec<VendorOrder>,
    subtotal: u64,
    shipping_cost: u64,
    tax: u64,
    total: u64,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_address: ShippingAddress,
    note: Option<String>,
    history: Vec<StatusHistoryEntry>,
    placed_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order in its sole initial state (`pending` at both
    /// levels) with the creation entry in its history.
    ///
    /// The financial invariants are enforced here, not trusted from the
    /// seed: `subtotal = Σ line totals`, `total = subtotal + shipping +
    /// tax`, and the vendor sub-orders must partition the items exactly.
    pub fn create(
        id: OrderId,
        number: OrderNumber,
        seed: OrderSeed,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if seed.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        for item in &seed.items {
            if item.quantity < 1 {
                return Err(DomainError::validation("item quantity must be at least 1"));
            }
            let expected = item.unit_price * item.quantity as u64;
            if item.line_total != expected {
                return Err(DomainError::invariant(format!(
                    "line total mismatch for product {}: {} != {}",
                    item.product_id, item.line_total, expected
                )));
            }
        }

        let subtotal: u64 = seed.items.iter().map(|i| i.line_total).sum();
        if subtotal != seed.subtotal {
            return Err(DomainError::invariant(format!(
                "subtotal {} does not equal sum of line totals {}",
                seed.subtotal, subtotal
            )));
        }
        if seed.total != seed.subtotal + seed.shipping_cost + seed.tax {
            return Err(DomainError::invariant(
                "total must equal subtotal + shipping + tax",
            ));
        }

        // The vendor sub-orders must partition the items exactly.
        for vendor in &seed.vendor_orders {
            let vendor_total: u64 = seed
                .items
                .iter()
                .filter(|i| i.vendor_id == vendor.vendor_id)
                .map(|i| i.line_total)
                .sum();
            if vendor_total == 0 {
                return Err(DomainError::invariant(format!(
                    "vendor order {} has no items",
                    vendor.vendor_id
                )));
            }
            if vendor_total != vendor.subtotal {
                return Err(DomainError::invariant(format!(
                    "vendor order {} subtotal {} does not match its items ({})",
                    vendor.vendor_id, vendor.subtotal, vendor_total
                )));
            }
        }
        let seeded: std::collections::HashSet<VendorId> =
            seed.vendor_orders.iter().map(|v| v.vendor_id).collect();
        if seeded.len() != seed.vendor_orders.len() {
            return Err(DomainError::invariant("duplicate vendor order"));
        }
        for item in &seed.items {
            if !seeded.contains(&item.vendor_id) {
                return Err(DomainError::invariant(format!(
                    "item {} belongs to no vendor order",
                    item.product_id
                )));
            }
        }

        if let Some(field) = seed.shipping_address.first_missing_field() {
            return Err(DomainError::validation(format!(
                "shipping address is missing required field '{field}'"
            )));
        }

        let vendor_orders = seed
            .vendor_orders
            .into_iter()
            .map(|v| VendorOrder {
                vendor_id: v.vendor_id,
                vendor_name: v.vendor_name,
                subtotal: v.subtotal,
                status: FulfillmentStatus::Pending,
                tracking_number: None,
                carrier: None,
                shipped_at: None,
                delivered_at: None,
            })
            .collect();

        let history = vec![StatusHistoryEntry {
            vendor_id: None,
            status: FulfillmentStatus::Pending,
            actor_id: vendora_core::ActorId::from_uuid(*seed.buyer_id.as_uuid()),
            actor_kind: ActorKind::Buyer,
            note: seed.note.clone(),
            recorded_at: placed_at,
        }];

        Ok(Self {
            id,
            number,
            buyer_id: seed.buyer_id,
            buyer_name: seed.buyer_name,
            buyer_email: seed.buyer_email,
            items: seed.items,
            vendor_orders,
            subtotal: seed.subtotal,
            shipping_cost: seed.shipping_cost,
            tax: seed.tax,
            total: seed.total,
            status: OrderStatus::Pending,
            payment_method: seed.payment_method,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: seed.shipping_address,
            note: seed.note,
            history,
            placed_at,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn number(&self) -> &OrderNumber {
        &self.number
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    pub fn buyer_email(&self) -> &str {
        &self.buyer_email
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn vendor_orders(&self) -> &[VendorOrder] {
        &self.vendor_orders
    }

    pub fn vendor_order(&self, vendor_id: VendorId) -> Option<&VendorOrder> {
        self.vendor_orders.iter().find(|v| v.vendor_id == vendor_id)
    }

    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    pub fn shipping_cost(&self) -> u64 {
        self.shipping_cost
    }

    pub fn tax(&self) -> u64 {
        self.tax
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.history
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Transition one vendor's sub-order.
    ///
    /// Enforces transition legality (forward skips allowed, regressions
    /// and terminal exits rejected), accepts tracking data only on the
    /// transition into `shipped`, stamps `shipped_at`/`delivered_at`
    /// exactly once, appends a history entry and re-derives the overall
    /// status.
    pub fn update_vendor_status(
        &mut self,
        vendor_id: VendorId,
        new_status: FulfillmentStatus,
        update: StatusUpdate,
    ) -> DomainResult<()> {
        let vendor = self
            .vendor_orders
            .iter_mut()
            .find(|v| v.vendor_id == vendor_id)
            .ok_or(DomainError::NotFound)?;

        if !vendor.status.can_transition_to(new_status) {
            return Err(DomainError::invariant(format!(
                "illegal status transition {} -> {}",
                vendor.status, new_status
            )));
        }

        if (update.tracking_number.is_some() || update.carrier.is_some())
            && new_status != FulfillmentStatus::Shipped
        {
            return Err(DomainError::validation(
                "tracking data is only accepted when transitioning to shipped",
            ));
        }

        match new_status {
            FulfillmentStatus::Shipped => {
                if vendor.shipped_at.is_none() {
                    vendor.shipped_at = Some(update.occurred_at);
                }
                if update.tracking_number.is_some() {
                    vendor.tracking_number = update.tracking_number.clone();
                }
                if update.carrier.is_some() {
                    vendor.carrier = update.carrier.clone();
                }
            }
            FulfillmentStatus::Delivered => {
                if vendor.delivered_at.is_none() {
                    vendor.delivered_at = Some(update.occurred_at);
                }
            }
            _ => {}
        }

        vendor.status = new_status;

        self.history.push(StatusHistoryEntry {
            vendor_id: Some(vendor_id),
            status: new_status,
            actor_id: update.actor_id,
            actor_kind: update.actor_kind,
            note: update.note,
            recorded_at: update.occurred_at,
        });

        self.recompute_status();
        Ok(())
    }

    /// Cancel the whole order: every non-terminal sub-order becomes
    /// `cancelled`. Fails if nothing is left to cancel.
    pub fn cancel(&mut self, update: StatusUpdate) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "order is already {}",
                self.status
            )));
        }

        let mut cancelled_any = false;
        for vendor in &mut self.vendor_orders {
            if !vendor.status.is_terminal() {
                vendor.status = FulfillmentStatus::Cancelled;
                cancelled_any = true;
            }
        }
        if !cancelled_any {
            return Err(DomainError::invariant("no cancellable vendor orders remain"));
        }

        self.history.push(StatusHistoryEntry {
            vendor_id: None,
            status: FulfillmentStatus::Cancelled,
            actor_id: update.actor_id,
            actor_kind: update.actor_kind,
            note: update.note,
            recorded_at: update.occurred_at,
        });

        self.recompute_status();
        Ok(())
    }

    /// Replace the payment label. Not part of the fulfillment state
    /// machine; capture/settlement live outside this system.
    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
    }

    fn recompute_status(&mut self) {
        let statuses: Vec<FulfillmentStatus> =
            self.vendor_orders.iter().map(|v| v.status).collect();
        self.status = derive_order_status(&statuses);
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
