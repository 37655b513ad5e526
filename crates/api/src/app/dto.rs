use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use vendora_cart::Cart;
use vendora_infra::StoredProduct;
use vendora_orders::{Order, ShippingAddress};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequestBody {
    pub shipping_address: Option<ShippingAddress>,
    pub saved_address_id: Option<String>,
    pub payment_method: String,
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Targets one vendor sub-order; omit only for a whole-order cancel.
    pub vendor_id: Option<String>,
    pub status: String,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub vendor_id: String,
    pub vendor_name: String,
    pub catalog_code: String,
    pub name: String,
    /// Price in smallest currency unit (cents).
    pub unit_price: u64,
    pub quantity_in_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBuyerRequest {
    pub name: String,
    pub email: String,
    pub default_address: Option<ShippingAddress>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn cart_to_json(cart: &Cart) -> JsonValue {
    json!({
        "buyer_id": cart.buyer_id().to_string(),
        "items": cart.items().iter().map(|item| json!({
            "product_id": item.product_id.to_string(),
            "vendor_id": item.vendor_id.to_string(),
            "quantity": item.quantity,
            "unit_price": item.unit_price,
        })).collect::<Vec<_>>(),
        "updated_at": cart.updated_at().to_rfc3339(),
    })
}

pub fn product_to_json(stored: &StoredProduct) -> JsonValue {
    let product = &stored.product;
    json!({
        "id": product.id_typed().to_string(),
        "vendor_id": product.vendor_id().to_string(),
        "vendor_name": product.vendor_name(),
        "catalog_code": product.code().to_string(),
        "name": product.name(),
        "unit_price": product.unit_price(),
        "quantity_in_stock": product.quantity_in_stock(),
        "status": product.status(),
        "units_sold": product.units_sold(),
        "version": stored.version,
    })
}

pub fn order_to_json(order: &Order) -> JsonValue {
    json!({
        "id": order.id_typed().to_string(),
        "order_number": order.number().to_string(),
        "buyer_id": order.buyer_id().to_string(),
        "buyer_name": order.buyer_name(),
        "buyer_email": order.buyer_email(),
        "status": order.status(),
        "payment_method": order.payment_method(),
        "payment_status": order.payment_status(),
        "subtotal": order.subtotal(),
        "shipping_cost": order.shipping_cost(),
        "tax": order.tax(),
        "total": order.total(),
        "shipping_address": order.shipping_address(),
        "note": order.note(),
        "placed_at": order.placed_at().to_rfc3339(),
        "items": order.items().iter().map(|item| json!({
            "product_id": item.product_id.to_string(),
            "product_name": item.product_name,
            "catalog_code": item.catalog_code,
            "vendor_id": item.vendor_id.to_string(),
            "vendor_name": item.vendor_name,
            "quantity": item.quantity,
            "unit_price": item.unit_price,
            "line_total": item.line_total,
        })).collect::<Vec<_>>(),
        "vendor_orders": order.vendor_orders().iter().map(|vendor| json!({
            "vendor_id": vendor.vendor_id().to_string(),
            "vendor_name": vendor.vendor_name(),
            "subtotal": vendor.subtotal(),
            "status": vendor.status(),
            "tracking_number": vendor.tracking_number(),
            "carrier": vendor.carrier(),
            "shipped_at": vendor.shipped_at().map(|t| t.to_rfc3339()),
            "delivered_at": vendor.delivered_at().map(|t| t.to_rfc3339()),
        })).collect::<Vec<_>>(),
        "status_history": order.history().iter().map(|entry| json!({
            "vendor_id": entry.vendor_id.map(|id| id.to_string()),
            "status": entry.status,
            "actor_id": entry.actor_id.to_string(),
            "actor_kind": entry.actor_kind,
            "note": entry.note,
            "recorded_at": entry.recorded_at.to_rfc3339(),
        })).collect::<Vec<_>>(),
    })
}
