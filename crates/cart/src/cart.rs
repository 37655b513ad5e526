use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{BuyerId, DomainError, DomainResult, Entity, ProductId, VendorId};

/// One reserved line in a buyer's cart.
///
/// `unit_price` is a display snapshot taken at add-to-cart time; checkout
/// re-reads the catalog and prices lines from the current record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub quantity: i64,
    /// Price in smallest currency unit (cents), snapshotted for display.
    pub unit_price: u64,
}

/// A buyer's cart: the mutable collection of (product, quantity)
/// reservations prior to checkout.
///
/// The cart has exactly one owner and is never contended; it is cleared
/// wholesale on successful order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    buyer_id: BuyerId,
    items: Vec<CartItem>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(buyer_id: BuyerId, now: DateTime<Utc>) -> Self {
        Self {
            buyer_id,
            items: Vec::new(),
            updated_at: now,
        }
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add an item, merging quantities when the product is already carted.
    pub fn add_item(&mut self, item: CartItem, now: DateTime<Utc>) -> DomainResult<()> {
        if item.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if item.unit_price == 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity += item.quantity;
            existing.unit_price = item.unit_price;
        } else {
            self.items.push(item);
        }

        self.updated_at = now;
        Ok(())
    }

    /// Replace the quantity of a carted product.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(DomainError::NotFound)?;
        item.quantity = quantity;

        self.updated_at = now;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: ProductId, now: DateTime<Utc>) -> DomainResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(DomainError::NotFound);
        }

        self.updated_at = now;
        Ok(())
    }

    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.items.clear();
        self.updated_at = now;
    }
}

impl Entity for Cart {
    type Id = BuyerId;

    fn id(&self) -> &Self::Id {
        &self.buyer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_item(product_id: ProductId, quantity: i64) -> CartItem {
        CartItem {
            product_id,
            vendor_id: VendorId::new(),
            quantity,
            unit_price: 1000,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn add_item_merges_same_product_quantities() {
        let mut cart = Cart::new(BuyerId::new(), now());
        let product_id = ProductId::new();

        cart.add_item(test_item(product_id, 2), now()).unwrap();
        cart.add_item(test_item(product_id, 3), now()).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn add_item_rejects_non_positive_quantity() {
        let mut cart = Cart::new(BuyerId::new(), now());
        let err = cart.add_item(test_item(ProductId::new(), 0), now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn set_quantity_replaces_rather_than_merges() {
        let mut cart = Cart::new(BuyerId::new(), now());
        let product_id = ProductId::new();

        cart.add_item(test_item(product_id, 2), now()).unwrap();
        cart.set_quantity(product_id, 7, now()).unwrap();

        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn set_quantity_on_missing_product_is_not_found() {
        let mut cart = Cart::new(BuyerId::new(), now());
        let err = cart.set_quantity(ProductId::new(), 2, now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn remove_and_clear_empty_the_cart() {
        let mut cart = Cart::new(BuyerId::new(), now());
        let a = ProductId::new();
        let b = ProductId::new();

        cart.add_item(test_item(a, 1), now()).unwrap();
        cart.add_item(test_item(b, 1), now()).unwrap();

        cart.remove_item(a, now()).unwrap();
        assert_eq!(cart.items().len(), 1);

        cart.clear(now());
        assert!(cart.is_empty());
    }
}
