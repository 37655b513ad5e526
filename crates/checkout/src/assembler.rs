use std::collections::{BTreeMap, HashMap};

use vendora_cart::Cart;
use vendora_catalog::{Product, ProductStatus};
use vendora_core::{AddressId, ProductId};
use vendora_orders::{
    OrderItem, OrderSeed, PaymentMethod, ShippingAddress, VendorOrderSeed,
};

use crate::buyer::BuyerProfile;
use crate::error::CheckoutError;

/// Checkout pricing policy. Shipping is free on this marketplace; tax is
/// a flat percentage of the subtotal, carried in basis points so the 8%
/// default stays exact on cent amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub tax_rate_basis_points: u64,
    /// Flat shipping cost in cents.
    pub shipping_cost: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            tax_rate_basis_points: 800,
            shipping_cost: 0,
        }
    }
}

impl CheckoutConfig {
    pub fn tax_on(&self, subtotal: u64) -> u64 {
        subtotal * self.tax_rate_basis_points / 10_000
    }
}

/// Buyer-supplied checkout input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Explicit destination; wins over everything else.
    pub shipping_address: Option<ShippingAddress>,
    /// Reference into the buyer's saved address book.
    pub saved_address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    /// Client-supplied token deduplicating checkout retries.
    pub idempotency_key: Option<String>,
}

/// The assembled shape of an order before any stock has been touched.
///
/// Items are in the deterministic order the commit coordinator reserves
/// them in (by vendor, then product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub buyer_id: vendora_core::BuyerId,
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

impl OrderDraft {
    pub fn into_seed(self) -> OrderSeed {
        OrderSeed {
            buyer_id: self.buyer_id,
            buyer_name: self.buyer_name,
            buyer_email: self.buyer_email,
            items: self.items,
            vendor_orders: self.vendor_orders,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax: self.tax,
            total: self.total,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            note: self.note,
        }
    }
}

/// Assemble an order draft from the cart and current catalog snapshots.
///
/// `products` holds the freshly re-read records for the carted product
/// ids; cart prices are display snapshots only and every line is priced
/// from the current record. Stock is pre-checked here so obviously-doomed
/// checkouts fail before any mutation; the reservation CAS remains
/// authoritative.
pub fn assemble(
    cart: &Cart,
    buyer: &BuyerProfile,
    request: &CheckoutRequest,
    products: &HashMap<ProductId, Product>,
    config: &CheckoutConfig,
) -> Result<OrderDraft, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let shipping_address = resolve_address(buyer, request)?;
    if let Some(field) = shipping_address.first_missing_field() {
        return Err(CheckoutError::validation(
            format!("shipping_address.{field}"),
            "required",
        ));
    }

    let mut items = Vec::with_capacity(cart.items().len());
    for line in cart.items() {
        let product = products
            .get(&line.product_id)
            .ok_or(CheckoutError::UnknownProduct {
                product_id: line.product_id,
            })?;

        // A depleted listing is an insufficiency (the buyer can adjust);
        // only a manually deactivated listing is unavailable outright.
        if product.status() == ProductStatus::Inactive {
            return Err(CheckoutError::ProductUnavailable {
                product_id: line.product_id,
                name: product.name().to_string(),
            });
        }
        if product.available() < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id,
                name: product.name().to_string(),
                available: product.available(),
            });
        }

        let unit_price = product.unit_price();
        items.push(OrderItem {
            product_id: line.product_id,
            product_name: product.name().to_string(),
            catalog_code: product.code().as_str().to_string(),
            vendor_id: product.vendor_id(),
            vendor_name: product.vendor_name().to_string(),
            quantity: line.quantity,
            unit_price,
            line_total: unit_price * line.quantity as u64,
        });
    }

    // Deterministic reservation order for the commit coordinator.
    items.sort_by(|a, b| {
        a.vendor_id
            .cmp(&b.vendor_id)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let mut per_vendor: BTreeMap<vendora_core::VendorId, (String, u64)> = BTreeMap::new();
    for item in &items {
        let entry = per_vendor
            .entry(item.vendor_id)
            .or_insert_with(|| (item.vendor_name.clone(), 0));
        entry.1 += item.line_total;
    }
    let vendor_orders = per_vendor
        .into_iter()
        .map(|(vendor_id, (vendor_name, subtotal))| VendorOrderSeed {
            vendor_id,
            vendor_name,
            subtotal,
        })
        .collect();

    let subtotal: u64 = items.iter().map(|i| i.line_total).sum();
    let shipping_cost = config.shipping_cost;
    let tax = config.tax_on(subtotal);
    let total = subtotal + shipping_cost + tax;

    Ok(OrderDraft {
        buyer_id: buyer.buyer_id,
        buyer_name: buyer.name.clone(),
        buyer_email: buyer.email.clone(),
        items,
        vendor_orders,
        subtotal,
        shipping_cost,
        tax,
        total,
        shipping_address,
        payment_method: request.payment_method,
        note: request.note.clone(),
    })
}

/// Address priority: explicit > saved-by-id > profile default.
fn resolve_address(
    buyer: &BuyerProfile,
    request: &CheckoutRequest,
) -> Result<ShippingAddress, CheckoutError> {
    if let Some(address) = &request.shipping_address {
        return Ok(address.clone());
    }
    if let Some(id) = request.saved_address_id {
        return buyer
            .saved_address(id)
            .cloned()
            .ok_or_else(|| CheckoutError::validation("saved_address_id", "no such saved address"));
    }
    buyer
        .default_address
        .clone()
        .ok_or_else(|| CheckoutError::validation("shipping_address", "no shipping address on file"))
}
