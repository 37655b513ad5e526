//! Infrastructure wiring: stores, event bus, commit coordinator and
//! fulfillment service behind one `AppServices` handle.

use std::sync::Arc;

use chrono::Utc;

use vendora_cart::{Cart, CartItem};
use vendora_catalog::Product;
use vendora_checkout::{BuyerProfile, CheckoutError, CheckoutRequest};
use vendora_core::{BuyerId, DomainError, OrderId, ProductId};
use vendora_events::{EventEnvelope, InMemoryEventBus};
use vendora_infra::{
    CartStore, CatalogStore, CheckoutCommitter, FulfillmentError, FulfillmentService,
    InMemoryBuyerDirectory, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
    OrderStore, StatusChange, StoreError, StoredProduct,
};
use vendora_orders::{Order, PaymentStatus};

use crate::config::ApiConfig;

/// Error surface of the cart/catalog service operations.
///
/// Checkout and fulfillment keep their own richer error types; this
/// covers the plain read/write paths.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type SharedBus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
type DynCatalog = Arc<dyn CatalogStore>;
type DynOrders = Arc<dyn OrderStore>;
type DynCarts = Arc<dyn CartStore>;
type DynBuyers = Arc<InMemoryBuyerDirectory>;

type Committer = CheckoutCommitter<DynCatalog, DynOrders, DynCarts, DynBuyers, SharedBus>;
type Fulfillment = FulfillmentService<DynOrders, SharedBus>;

pub struct AppServices {
    pub catalog: DynCatalog,
    pub orders: DynOrders,
    pub carts: DynCarts,
    pub buyers: DynBuyers,
    pub bus: SharedBus,
    committer: Committer,
    fulfillment: Fulfillment,
}

/// Wire the pipeline over the configured backends.
///
/// With the `postgres` feature and `DATABASE_URL` set, catalog and order
/// records live in Postgres; carts and buyer profiles stay in memory
/// (session-scoped artifacts and an external collaborator's data,
/// respectively).
pub async fn build_services(config: &ApiConfig) -> AppServices {
    #[cfg(feature = "postgres")]
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        return build_postgres_services(config, &database_url).await;
    }

    let catalog: DynCatalog = Arc::new(InMemoryCatalogStore::new());
    let orders: DynOrders = Arc::new(InMemoryOrderStore::new());
    build_with_stores(config, catalog, orders)
}

#[cfg(feature = "postgres")]
async fn build_postgres_services(config: &ApiConfig, database_url: &str) -> AppServices {
    use vendora_infra::store::{ensure_schema, PostgresCatalogStore, PostgresOrderStore};

    let pool = sqlx::PgPool::connect(database_url)
        .await
        .expect("failed to connect to Postgres");
    ensure_schema(&pool).await.expect("failed to ensure schema");

    let catalog: DynCatalog = Arc::new(PostgresCatalogStore::new(pool.clone()));
    let orders: DynOrders = Arc::new(PostgresOrderStore::new(pool));
    build_with_stores(config, catalog, orders)
}

fn build_with_stores(config: &ApiConfig, catalog: DynCatalog, orders: DynOrders) -> AppServices {
    let carts: DynCarts = Arc::new(InMemoryCartStore::new());
    let buyers: DynBuyers = Arc::new(InMemoryBuyerDirectory::new());
    let bus: SharedBus = Arc::new(InMemoryEventBus::new());

    let committer = CheckoutCommitter::new(
        catalog.clone(),
        orders.clone(),
        carts.clone(),
        buyers.clone(),
        bus.clone(),
        config.retry_policy(),
        config.committer_config(),
    );
    let fulfillment = FulfillmentService::new(orders.clone(), bus.clone(), config.retry_policy());

    AppServices {
        catalog,
        orders,
        carts,
        buyers,
        bus,
        committer,
        fulfillment,
    }
}

impl AppServices {
    // ---- cart ----

    pub fn get_cart(&self, buyer_id: BuyerId) -> Result<Cart, ServiceError> {
        Ok(self
            .carts
            .get(buyer_id)?
            .unwrap_or_else(|| Cart::new(buyer_id, Utc::now())))
    }

    pub fn add_to_cart(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        let stored = self
            .catalog
            .get(product_id)?
            .ok_or(ServiceError::UnknownProduct(product_id))?;

        let now = Utc::now();
        let mut cart = self
            .carts
            .get(buyer_id)?
            .unwrap_or_else(|| Cart::new(buyer_id, now));
        cart.add_item(
            CartItem {
                product_id,
                vendor_id: stored.product.vendor_id(),
                quantity,
                unit_price: stored.product.unit_price(),
            },
            now,
        )?;
        self.carts.put(cart.clone())?;
        Ok(cart)
    }

    pub fn update_cart_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self.carts.get(buyer_id)?.ok_or(DomainError::NotFound)?;
        cart.set_quantity(product_id, quantity, Utc::now())?;
        self.carts.put(cart.clone())?;
        Ok(cart)
    }

    pub fn remove_cart_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self.carts.get(buyer_id)?.ok_or(DomainError::NotFound)?;
        cart.remove_item(product_id, Utc::now())?;
        self.carts.put(cart.clone())?;
        Ok(cart)
    }

    pub fn clear_cart(&self, buyer_id: BuyerId) -> Result<(), ServiceError> {
        self.carts.clear(buyer_id)?;
        Ok(())
    }

    // ---- checkout ----

    pub fn checkout(
        &self,
        buyer_id: BuyerId,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        self.committer.commit(buyer_id, request, Utc::now())
    }

    // ---- orders ----

    pub fn list_orders(&self, buyer_id: BuyerId) -> Result<Vec<Order>, ServiceError> {
        Ok(self
            .orders
            .list_by_buyer(buyer_id)?
            .into_iter()
            .map(|stored| stored.order)
            .collect())
    }

    /// Buyer-scoped read: an order belonging to someone else is invisible.
    pub fn get_order(
        &self,
        buyer_id: BuyerId,
        order_id: OrderId,
    ) -> Result<Option<Order>, ServiceError> {
        Ok(self
            .orders
            .get(order_id)?
            .map(|stored| stored.order)
            .filter(|order| order.buyer_id() == buyer_id))
    }

    pub fn update_order_status(
        &self,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<Order, FulfillmentError> {
        self.fulfillment.update_status(order_id, change)
    }

    pub fn set_payment_status(
        &self,
        order_id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, FulfillmentError> {
        self.fulfillment.set_payment_status(order_id, status)
    }

    // ---- catalog + directory (seeding surface) ----

    pub fn create_product(&self, product: Product) -> Result<StoredProduct, ServiceError> {
        Ok(self.catalog.insert(product)?)
    }

    pub fn list_products(&self) -> Result<Vec<StoredProduct>, ServiceError> {
        Ok(self.catalog.list()?)
    }

    pub fn get_product(&self, product_id: ProductId) -> Result<Option<StoredProduct>, ServiceError> {
        Ok(self.catalog.get(product_id)?)
    }

    pub fn register_buyer(&self, profile: BuyerProfile) {
        self.buyers.register(profile);
    }
}
