//! `vendora-orders` — persisted orders, vendor sub-orders and the
//! two-level fulfillment state machine.

pub mod address;
pub mod event;
pub mod number;
pub mod order;
pub mod status;

pub use address::ShippingAddress;
pub use event::{OrderEvent, OrderPlaced, OrderStatusUpdated};
pub use number::OrderNumber;
pub use order::{
    Order, OrderItem, OrderSeed, PaymentMethod, PaymentStatus, VendorOrder, VendorOrderSeed,
};
pub use status::{
    derive_order_status, ActorKind, FulfillmentStatus, OrderStatus, StatusHistoryEntry,
    StatusUpdate,
};
