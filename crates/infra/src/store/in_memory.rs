use std::collections::HashMap;
use std::sync::RwLock;

use vendora_cart::Cart;
use vendora_catalog::Product;
use vendora_core::{BuyerId, ExpectedVersion, OrderId, ProductId};
use vendora_orders::{Order, OrderNumber};

use super::r#trait::{
    CartStore, CatalogStore, OrderStore, StoreError, StoredOrder, StoredProduct,
};

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

/// In-memory versioned product store.
///
/// Intended for tests/dev. The whole-map write lock makes each
/// conditional update atomic; contention is resolved by the version
/// check, exactly as a row-level conditional UPDATE would.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    records: RwLock<HashMap<ProductId, StoredProduct>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert(&self, product: Product) -> Result<StoredProduct, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        if records.contains_key(&product.id_typed()) {
            return Err(StoreError::Duplicate {
                field: "product_id",
                value: product.id_typed().to_string(),
            });
        }
        if records
            .values()
            .any(|stored| stored.product.code() == product.code())
        {
            return Err(StoreError::Duplicate {
                field: "catalog_code",
                value: product.code().to_string(),
            });
        }

        let stored = StoredProduct {
            product,
            version: 1,
        };
        records.insert(stored.product.id_typed(), stored.clone());
        Ok(stored)
    }

    fn get(&self, product_id: ProductId) -> Result<Option<StoredProduct>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&product_id).cloned())
    }

    fn list(&self) -> Result<Vec<StoredProduct>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut all: Vec<StoredProduct> = records.values().cloned().collect();
        all.sort_by(|a, b| a.product.id_typed().cmp(&b.product.id_typed()));
        Ok(all)
    }

    fn update(
        &self,
        expected: ExpectedVersion,
        product: Product,
    ) -> Result<StoredProduct, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        let current = records
            .get_mut(&product.id_typed())
            .ok_or(StoreError::NotFound)?;

        if !expected.matches(current.version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                current.version
            )));
        }

        current.product = product;
        current.version += 1;
        Ok(current.clone())
    }
}

/// In-memory versioned order store with an order-number uniqueness
/// constraint.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    records: RwLock<HashMap<OrderId, StoredOrder>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> Result<StoredOrder, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        if records.contains_key(&order.id_typed()) {
            return Err(StoreError::Duplicate {
                field: "order_id",
                value: order.id_typed().to_string(),
            });
        }
        if records
            .values()
            .any(|stored| stored.order.number() == order.number())
        {
            return Err(StoreError::Duplicate {
                field: "order_number",
                value: order.number().to_string(),
            });
        }

        let stored = StoredOrder { order, version: 1 };
        records.insert(stored.order.id_typed(), stored.clone());
        Ok(stored)
    }

    fn get(&self, order_id: OrderId) -> Result<Option<StoredOrder>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&order_id).cloned())
    }

    fn get_by_number(&self, number: &OrderNumber) -> Result<Option<StoredOrder>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .values()
            .find(|stored| stored.order.number() == number)
            .cloned())
    }

    fn list_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<StoredOrder>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut orders: Vec<StoredOrder> = records
            .values()
            .filter(|stored| stored.order.buyer_id() == buyer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.order.placed_at().cmp(&b.order.placed_at()));
        Ok(orders)
    }

    fn update(&self, expected: ExpectedVersion, order: Order) -> Result<StoredOrder, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        let current = records
            .get_mut(&order.id_typed())
            .ok_or(StoreError::NotFound)?;

        if !expected.matches(current.version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                current.version
            )));
        }

        current.order = order;
        current.version += 1;
        Ok(current.clone())
    }
}

/// In-memory cart store. Carts are keyed by owner and never contended.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<BuyerId, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for InMemoryCartStore {
    fn get(&self, buyer_id: BuyerId) -> Result<Option<Cart>, StoreError> {
        let carts = self.carts.read().map_err(|_| poisoned())?;
        Ok(carts.get(&buyer_id).cloned())
    }

    fn put(&self, cart: Cart) -> Result<(), StoreError> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;
        carts.insert(cart.buyer_id(), cart);
        Ok(())
    }

    fn clear(&self, buyer_id: BuyerId) -> Result<(), StoreError> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;
        carts.remove(&buyer_id);
        Ok(())
    }
}
