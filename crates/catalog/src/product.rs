use serde::{Deserialize, Serialize};
use thiserror::Error;

use vendora_core::{DomainError, DomainResult, Entity, ProductId, ValueObject, VendorId};

/// Unique catalog code in NDC-like form: three dash-separated digit
/// segments totalling 10 or 11 digits (e.g. `0002-1433-80`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogCode(String);

impl CatalogCode {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let segments: Vec<&str> = raw.split('-').collect();

        let well_formed = segments.len() == 3
            && segments
                .iter()
                .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()));
        let digits: usize = segments.iter().map(|s| s.len()).sum();

        if !well_formed || !(10..=11).contains(&digits) {
            return Err(DomainError::validation(format!(
                "catalog code '{raw}' is not a valid NDC-like code"
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CatalogCode {}

impl core::fmt::Display for CatalogCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product status lifecycle.
///
/// `OutOfStock` is derived from stock; `Inactive` is a manual override
/// that survives restocks until the vendor reactivates the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
}

/// Failure of a (pure) stock decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("requested quantity must be at least 1")]
    InvalidQuantity,

    #[error("product is not available for ordering")]
    Unavailable,

    #[error("insufficient stock: {available} available")]
    Insufficient { available: i64 },
}

/// A vendor's catalog listing.
///
/// `quantity_in_stock` never goes negative; `units_sold` accumulates
/// every reserved unit (consumed by analytics downstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    vendor_id: VendorId,
    vendor_name: String,
    code: CatalogCode,
    name: String,
    /// Price in smallest currency unit (cents).
    unit_price: u64,
    quantity_in_stock: i64,
    status: ProductStatus,
    units_sold: u64,
}

impl Product {
    pub fn new(
        id: ProductId,
        vendor_id: VendorId,
        vendor_name: impl Into<String>,
        code: CatalogCode,
        name: impl Into<String>,
        unit_price: u64,
        quantity_in_stock: i64,
    ) -> DomainResult<Self> {
        let vendor_name = vendor_name.into();
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if vendor_name.trim().is_empty() {
            return Err(DomainError::validation("vendor name cannot be empty"));
        }
        if unit_price == 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }
        if quantity_in_stock < 0 {
            return Err(DomainError::validation("quantity_in_stock cannot be negative"));
        }

        let mut product = Self {
            id,
            vendor_id,
            vendor_name,
            code,
            name,
            unit_price,
            quantity_in_stock,
            status: ProductStatus::Active,
            units_sold: 0,
        };
        product.recompute_status();
        Ok(product)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    pub fn code(&self) -> &CatalogCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn quantity_in_stock(&self) -> i64 {
        self.quantity_in_stock
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn units_sold(&self) -> u64 {
        self.units_sold
    }

    /// Quantity a new reservation could still claim.
    pub fn available(&self) -> i64 {
        self.quantity_in_stock
    }

    /// Manually pull the listing from the marketplace.
    pub fn deactivate(&mut self) {
        self.status = ProductStatus::Inactive;
    }

    /// Undo a manual deactivation; status falls back to stock-derived.
    pub fn reactivate(&mut self) {
        self.status = ProductStatus::Active;
        self.recompute_status();
    }

    /// Decide a reservation of `quantity` units: returns the record as it
    /// would be after the decrement. The caller is responsible for writing
    /// it back conditionally (the stored version must not have moved).
    pub fn reserve(&self, quantity: i64) -> Result<Product, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity);
        }
        if self.status == ProductStatus::Inactive {
            return Err(StockError::Unavailable);
        }
        if self.quantity_in_stock < quantity {
            return Err(StockError::Insufficient {
                available: self.quantity_in_stock,
            });
        }

        let mut updated = self.clone();
        updated.quantity_in_stock -= quantity;
        updated.units_sold += quantity as u64;
        updated.recompute_status();
        Ok(updated)
    }

    /// Undo a reservation (commit rollback): restores stock and the
    /// sales counter.
    pub fn release(&self, quantity: i64) -> Product {
        let mut updated = self.clone();
        updated.quantity_in_stock += quantity.max(0);
        updated.units_sold = updated.units_sold.saturating_sub(quantity.max(0) as u64);
        updated.recompute_status();
        updated
    }

    /// status = out_of_stock iff stock <= 0, unless manually inactive.
    fn recompute_status(&mut self) {
        if self.status == ProductStatus::Inactive {
            return;
        }
        self.status = if self.quantity_in_stock <= 0 {
            ProductStatus::OutOfStock
        } else {
            ProductStatus::Active
        };
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(stock: i64) -> Product {
        Product::new(
            ProductId::new(),
            VendorId::new(),
            "Acme Wholesale",
            CatalogCode::parse("0002-1433-80").unwrap(),
            "Amoxicillin 500mg",
            1000,
            stock,
        )
        .unwrap()
    }

    #[test]
    fn catalog_code_accepts_ndc_shapes() {
        assert!(CatalogCode::parse("0002-1433-80").is_ok());
        assert!(CatalogCode::parse("50580-449-05").is_ok());
        assert!(CatalogCode::parse("50580-4490-5").is_ok());
    }

    #[test]
    fn catalog_code_rejects_malformed_input() {
        for raw in ["", "abc", "0002-1433", "0002-1433-800000", "00-02-14-33"] {
            assert!(CatalogCode::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn new_product_with_zero_stock_starts_out_of_stock() {
        let product = test_product(0);
        assert_eq!(product.status(), ProductStatus::OutOfStock);
    }

    #[test]
    fn new_product_rejects_zero_price() {
        let err = Product::new(
            ProductId::new(),
            VendorId::new(),
            "Acme Wholesale",
            CatalogCode::parse("0002-1433-80").unwrap(),
            "Amoxicillin 500mg",
            0,
            5,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reserve_decrements_stock_and_bumps_sales_counter() {
        let product = test_product(5);
        let reserved = product.reserve(3).unwrap();
        assert_eq!(reserved.quantity_in_stock(), 2);
        assert_eq!(reserved.units_sold(), 3);
        assert_eq!(reserved.status(), ProductStatus::Active);
        // The original record is untouched (pure decision).
        assert_eq!(product.quantity_in_stock(), 5);
    }

    #[test]
    fn reserving_the_last_unit_flips_status_to_out_of_stock() {
        let product = test_product(1);
        let reserved = product.reserve(1).unwrap();
        assert_eq!(reserved.quantity_in_stock(), 0);
        assert_eq!(reserved.status(), ProductStatus::OutOfStock);
    }

    #[test]
    fn reserve_reports_available_quantity_on_insufficiency() {
        let product = test_product(2);
        let err = product.reserve(3).unwrap_err();
        assert_eq!(err, StockError::Insufficient { available: 2 });
    }

    #[test]
    fn reserve_rejects_non_positive_quantity() {
        let product = test_product(5);
        assert_eq!(product.reserve(0).unwrap_err(), StockError::InvalidQuantity);
        assert_eq!(product.reserve(-2).unwrap_err(), StockError::InvalidQuantity);
    }

    #[test]
    fn inactive_products_cannot_be_reserved_even_with_stock() {
        let mut product = test_product(5);
        product.deactivate();
        assert_eq!(product.reserve(1).unwrap_err(), StockError::Unavailable);
    }

    #[test]
    fn release_restores_stock_and_sales_counter() {
        let product = test_product(1);
        let reserved = product.reserve(1).unwrap();
        assert_eq!(reserved.status(), ProductStatus::OutOfStock);

        let released = reserved.release(1);
        assert_eq!(released.quantity_in_stock(), 1);
        assert_eq!(released.units_sold(), 0);
        assert_eq!(released.status(), ProductStatus::Active);
    }

    #[test]
    fn manual_deactivation_survives_release() {
        let mut product = test_product(5);
        let reserved = product.reserve(2).unwrap();
        product = reserved;
        product.deactivate();

        let released = product.release(2);
        assert_eq!(released.status(), ProductStatus::Inactive);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: stock never goes negative through any sequence of
            /// accepted reservations.
            #[test]
            fn accepted_reservations_never_overdraw(
                initial in 0i64..1000,
                requests in proptest::collection::vec(1i64..50, 0..40)
            ) {
                let mut product = test_product(initial);

                for quantity in requests {
                    match product.reserve(quantity) {
                        Ok(updated) => product = updated,
                        Err(StockError::Insufficient { available }) => {
                            prop_assert_eq!(available, product.quantity_in_stock());
                        }
                        Err(_) => {}
                    }
                    prop_assert!(product.quantity_in_stock() >= 0);
                }
            }

            /// Property: reserve followed by release is an identity on
            /// stock, sales counter and derived status.
            #[test]
            fn release_undoes_reserve(
                initial in 1i64..1000,
                quantity in 1i64..50
            ) {
                let product = test_product(initial);
                prop_assume!(quantity <= initial);

                let released = product.reserve(quantity).unwrap().release(quantity);
                prop_assert_eq!(released.quantity_in_stock(), product.quantity_in_stock());
                prop_assert_eq!(released.units_sold(), product.units_sold());
                prop_assert_eq!(released.status(), product.status());
            }

            /// Property: derived status tracks stock exactly unless the
            /// listing was manually deactivated.
            #[test]
            fn status_matches_stock(initial in 0i64..20, quantity in 1i64..20) {
                let product = test_product(initial.max(1));
                if let Ok(updated) = product.reserve(quantity) {
                    let expected = if updated.quantity_in_stock() <= 0 {
                        ProductStatus::OutOfStock
                    } else {
                        ProductStatus::Active
                    };
                    prop_assert_eq!(updated.status(), expected);
                }
            }
        }
    }
}
