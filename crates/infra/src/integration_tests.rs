//! Cross-component tests of the full order pipeline: assembler,
//! reservation manager, commit coordinator and fulfillment service wired
//! over the in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use vendora_cart::{Cart, CartItem};
use vendora_catalog::{CatalogCode, Product, ProductStatus};
use vendora_checkout::{BuyerProfile, CheckoutError, CheckoutRequest};
use vendora_core::{ActorId, BuyerId, ProductId, VendorId};
use vendora_events::{EventBus, EventEnvelope, InMemoryEventBus};
use vendora_orders::{
    ActorKind, FulfillmentStatus, OrderStatus, PaymentMethod, ShippingAddress,
};

use crate::buyers::InMemoryBuyerDirectory;
use crate::committer::{CheckoutCommitter, CommitterConfig};
use crate::fulfillment::{FulfillmentService, StatusChange};
use crate::reservation::RetryPolicy;
use crate::store::{
    CartStore, CatalogStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
    OrderStore, StoreError,
};

type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
type Committer = CheckoutCommitter<
    Arc<InMemoryCatalogStore>,
    Arc<InMemoryOrderStore>,
    Arc<InMemoryCartStore>,
    Arc<InMemoryBuyerDirectory>,
    Bus,
>;

struct Harness {
    catalog: Arc<InMemoryCatalogStore>,
    orders: Arc<InMemoryOrderStore>,
    carts: Arc<InMemoryCartStore>,
    buyers: Arc<InMemoryBuyerDirectory>,
    bus: Bus,
    committer: Arc<Committer>,
    fulfillment: FulfillmentService<Arc<InMemoryOrderStore>, Bus>,
}

fn harness() -> Harness {
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let buyers = Arc::new(InMemoryBuyerDirectory::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());

    // Generous retries so contention tests resolve instead of exhausting.
    let retry = RetryPolicy::new(25, Duration::from_millis(1));

    let committer = Arc::new(CheckoutCommitter::new(
        catalog.clone(),
        orders.clone(),
        carts.clone(),
        buyers.clone(),
        bus.clone(),
        retry,
        CommitterConfig::default(),
    ));
    let fulfillment = FulfillmentService::new(orders.clone(), bus.clone(), retry);

    Harness {
        catalog,
        orders,
        carts,
        buyers,
        bus,
        committer,
        fulfillment,
    }
}

fn test_address() -> ShippingAddress {
    ShippingAddress {
        recipient: "Riverside Pharmacy".to_string(),
        street: "420 Commerce Way".to_string(),
        city: "Columbus".to_string(),
        region: "OH".to_string(),
        postal_code: "43004".to_string(),
        country: "US".to_string(),
        phone: None,
    }
}

fn seed_buyer(h: &Harness) -> BuyerId {
    let buyer_id = BuyerId::new();
    h.buyers.register(BuyerProfile {
        buyer_id,
        name: "Riverside Pharmacy".to_string(),
        email: "orders@riverside.example".to_string(),
        default_address: Some(test_address()),
        saved_addresses: Vec::new(),
    });
    buyer_id
}

fn seed_product(
    h: &Harness,
    vendor_id: VendorId,
    vendor_name: &str,
    code: &str,
    name: &str,
    unit_price: u64,
    stock: i64,
) -> ProductId {
    let product = Product::new(
        ProductId::new(),
        vendor_id,
        vendor_name,
        CatalogCode::parse(code).unwrap(),
        name,
        unit_price,
        stock,
    )
    .unwrap();
    let id = product.id_typed();
    h.catalog.insert(product).unwrap();
    id
}

fn put_in_cart(h: &Harness, buyer_id: BuyerId, product_id: ProductId, quantity: i64) {
    let now = Utc::now();
    let stored = h.catalog.get(product_id).unwrap().unwrap();
    let mut cart = h
        .carts
        .get(buyer_id)
        .unwrap()
        .unwrap_or_else(|| Cart::new(buyer_id, now));
    cart.add_item(
        CartItem {
            product_id,
            vendor_id: stored.product.vendor_id(),
            quantity,
            unit_price: stored.product.unit_price(),
        },
        now,
    )
    .unwrap();
    h.carts.put(cart).unwrap();
}

fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: None,
        saved_address_id: None,
        payment_method: PaymentMethod::BankTransfer,
        note: None,
        idempotency_key: None,
    }
}

fn stock_of(h: &Harness, product_id: ProductId) -> i64 {
    h.catalog
        .get(product_id)
        .unwrap()
        .unwrap()
        .product
        .quantity_in_stock()
}

#[test]
fn multi_vendor_checkout_commits_stock_totals_and_sub_orders() {
    // Two items from vendor 1 (3 @ $10, stock 5) and one from vendor 2
    // (1 @ $20, stock 1).
    let h = harness();
    let buyer_id = seed_buyer(&h);
    let v1 = VendorId::new();
    let v2 = VendorId::new();
    let p1 = seed_product(&h, v1, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);
    let p2 = seed_product(&h, v2, "Beta Distributors", "50580-449-05", "Ibuprofen 200mg", 2000, 1);

    put_in_cart(&h, buyer_id, p1, 3);
    put_in_cart(&h, buyer_id, p2, 1);

    let events = h.bus.subscribe();
    let order = h.committer.commit(buyer_id, request(), Utc::now()).unwrap();

    assert_eq!(order.subtotal(), 5000);
    assert_eq!(order.shipping_cost(), 0);
    assert_eq!(order.tax(), 400);
    assert_eq!(order.total(), 5400);
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.vendor_orders().len(), 2);
    assert_eq!(order.vendor_order(v1).unwrap().subtotal(), 3000);
    assert_eq!(order.vendor_order(v2).unwrap().subtotal(), 2000);

    assert_eq!(stock_of(&h, p1), 2);
    assert_eq!(stock_of(&h, p2), 0);
    assert_eq!(
        h.catalog.get(p2).unwrap().unwrap().product.status(),
        ProductStatus::OutOfStock
    );

    // Cart cleared atomically with the commit.
    assert!(h.carts.get(buyer_id).unwrap().is_none());

    // Order persisted and listed for the buyer.
    let listed = h.orders.list_by_buyer(buyer_id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].order.number(), order.number());

    // The fact is on the bus for downstream consumers.
    let envelope = events.try_recv().unwrap();
    assert_eq!(envelope.topic(), "order.placed");
}

#[test]
fn failed_reservation_aborts_the_whole_commit() {
    // Same cart, but vendor 2's stock is gone by commit time.
    let h = harness();
    let buyer_id = seed_buyer(&h);
    let v1 = VendorId::new();
    let v2 = VendorId::new();
    let p1 = seed_product(&h, v1, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);
    let p2 = seed_product(&h, v2, "Beta Distributors", "50580-449-05", "Ibuprofen 200mg", 2000, 0);

    put_in_cart(&h, buyer_id, p1, 3);
    put_in_cart(&h, buyer_id, p2, 1);

    let err = h.committer.commit(buyer_id, request(), Utc::now()).unwrap_err();
    match err {
        CheckoutError::InsufficientStock {
            name, available, ..
        } => {
            assert_eq!(name, "Ibuprofen 200mg");
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // No partial decrement, no order, cart untouched.
    assert_eq!(stock_of(&h, p1), 5);
    assert_eq!(
        h.catalog.get(p1).unwrap().unwrap().product.units_sold(),
        0
    );
    assert!(h.orders.list_by_buyer(buyer_id).unwrap().is_empty());
    assert_eq!(h.carts.get(buyer_id).unwrap().unwrap().items().len(), 2);
}

/// Catalog store wrapper that makes every conditional write for one
/// product lose, as if a competing buyer always got there first.
#[derive(Clone)]
struct ContestedCatalogStore {
    inner: Arc<InMemoryCatalogStore>,
    contested: ProductId,
}

impl CatalogStore for ContestedCatalogStore {
    fn insert(&self, product: vendora_catalog::Product) -> Result<crate::store::StoredProduct, StoreError> {
        self.inner.insert(product)
    }

    fn get(&self, product_id: ProductId) -> Result<Option<crate::store::StoredProduct>, StoreError> {
        self.inner.get(product_id)
    }

    fn list(&self) -> Result<Vec<crate::store::StoredProduct>, StoreError> {
        self.inner.list()
    }

    fn update(
        &self,
        expected: vendora_core::ExpectedVersion,
        product: vendora_catalog::Product,
    ) -> Result<crate::store::StoredProduct, StoreError> {
        if product.id_typed() == self.contested {
            return Err(StoreError::Concurrency(
                "simulated competing writer".to_string(),
            ));
        }
        self.inner.update(expected, product)
    }
}

#[test]
fn exhausted_reservation_releases_prior_reservations_and_aborts() {
    // The second product in reservation order loses every conditional
    // write; the commit must surface a retryable conflict and roll the
    // first product's reservation back.
    let inner = Arc::new(InMemoryCatalogStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let buyers = Arc::new(InMemoryBuyerDirectory::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());

    let v1 = VendorId::new();
    let v2 = VendorId::new();
    let (first, second) = if v1 < v2 { (v1, v2) } else { (v2, v1) };

    let p_ok = Product::new(
        ProductId::new(),
        first,
        "Acme Wholesale",
        CatalogCode::parse("0002-1433-80").unwrap(),
        "Amoxicillin 500mg",
        1000,
        5,
    )
    .unwrap();
    let p_contested = Product::new(
        ProductId::new(),
        second,
        "Beta Distributors",
        CatalogCode::parse("50580-449-05").unwrap(),
        "Ibuprofen 200mg",
        2000,
        4,
    )
    .unwrap();
    let p_ok_id = p_ok.id_typed();
    let contested_id = p_contested.id_typed();
    inner.insert(p_ok).unwrap();
    inner.insert(p_contested).unwrap();

    let catalog = ContestedCatalogStore {
        inner: inner.clone(),
        contested: contested_id,
    };
    let committer = CheckoutCommitter::new(
        catalog,
        orders.clone(),
        carts.clone(),
        buyers.clone(),
        bus,
        RetryPolicy::new(3, Duration::from_millis(1)),
        CommitterConfig::default(),
    );

    let buyer_id = BuyerId::new();
    buyers.register(BuyerProfile {
        buyer_id,
        name: "Riverside Pharmacy".to_string(),
        email: "orders@riverside.example".to_string(),
        default_address: Some(test_address()),
        saved_addresses: Vec::new(),
    });

    let now = Utc::now();
    let mut cart = Cart::new(buyer_id, now);
    cart.add_item(
        CartItem {
            product_id: p_ok_id,
            vendor_id: first,
            quantity: 3,
            unit_price: 1000,
        },
        now,
    )
    .unwrap();
    cart.add_item(
        CartItem {
            product_id: contested_id,
            vendor_id: second,
            quantity: 1,
            unit_price: 2000,
        },
        now,
    )
    .unwrap();
    carts.put(cart).unwrap();

    let err = committer.commit(buyer_id, request(), Utc::now()).unwrap_err();
    assert!(matches!(err, CheckoutError::Conflict(_)));

    // The first product's reservation was rolled back; nothing persisted.
    let restored = inner.get(p_ok_id).unwrap().unwrap().product;
    assert_eq!(restored.quantity_in_stock(), 5);
    assert_eq!(restored.units_sold(), 0);
    assert!(orders.list_by_buyer(buyer_id).unwrap().is_empty());
    assert_eq!(carts.get(buyer_id).unwrap().unwrap().items().len(), 2);
}

#[test]
fn empty_cart_is_rejected_before_any_mutation() {
    let h = harness();
    let buyer_id = seed_buyer(&h);

    let err = h.committer.commit(buyer_id, request(), Utc::now()).unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[test]
fn two_concurrent_checkouts_for_the_same_stock_admit_exactly_one() {
    // Two buyers each want 3 of a product with stock 5.
    let h = harness();
    let v = VendorId::new();
    let product_id = seed_product(&h, v, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);

    let buyer_a = seed_buyer(&h);
    let buyer_b = seed_buyer(&h);
    put_in_cart(&h, buyer_a, product_id, 3);
    put_in_cart(&h, buyer_b, product_id, 3);

    let committer = h.committer.clone();
    let a = {
        let committer = committer.clone();
        std::thread::spawn(move || committer.commit(buyer_a, request(), Utc::now()))
    };
    let b = {
        let committer = committer.clone();
        std::thread::spawn(move || committer.commit(buyer_b, request(), Utc::now()))
    };

    let results = [a.join().unwrap(), b.join().unwrap()];
    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one checkout must win");

    for result in &results {
        if let Err(e) = result {
            match e {
                CheckoutError::InsufficientStock { available, .. } => {
                    assert_eq!(*available, 2);
                }
                other => panic!("loser should see insufficiency, got {other:?}"),
            }
        }
    }

    assert_eq!(stock_of(&h, product_id), 2);
}

#[test]
fn oversubscribed_concurrent_checkouts_never_overdraw_stock() {
    // Eight buyers, 2 units each, stock 10: exactly five orders fit.
    let h = harness();
    let v = VendorId::new();
    let product_id = seed_product(&h, v, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 10);

    let mut buyers = Vec::new();
    for _ in 0..8 {
        let buyer_id = seed_buyer(&h);
        put_in_cart(&h, buyer_id, product_id, 2);
        buyers.push(buyer_id);
    }

    let committer = h.committer.clone();
    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer_id| {
            let committer = committer.clone();
            std::thread::spawn(move || committer.commit(buyer_id, request(), Utc::now()))
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => accepted += 1,
            Err(CheckoutError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(stock_of(&h, product_id), 0);
    let product = h.catalog.get(product_id).unwrap().unwrap().product;
    assert_eq!(product.units_sold(), 10);
    assert_eq!(product.status(), ProductStatus::OutOfStock);
}

#[test]
fn repeated_idempotency_key_replays_the_original_order() {
    let h = harness();
    let buyer_id = seed_buyer(&h);
    let v = VendorId::new();
    let product_id = seed_product(&h, v, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);
    put_in_cart(&h, buyer_id, product_id, 2);

    let mut req = request();
    req.idempotency_key = Some("checkout-77f2".to_string());

    let first = h.committer.commit(buyer_id, req.clone(), Utc::now()).unwrap();
    let second = h.committer.commit(buyer_id, req, Utc::now()).unwrap();

    assert_eq!(first.number(), second.number());
    assert_eq!(first.id_typed(), second.id_typed());
    // Stock was decremented exactly once.
    assert_eq!(stock_of(&h, product_id), 3);
    assert_eq!(h.orders.list_by_buyer(buyer_id).unwrap().len(), 1);
}

#[test]
fn order_number_uniqueness_is_enforced_by_the_store() {
    use vendora_orders::{Order, OrderItem, OrderNumber, OrderSeed, VendorOrderSeed};

    let h = harness();
    let vendor_id = VendorId::new();

    let seed = |buyer_id: BuyerId| OrderSeed {
        buyer_id,
        buyer_name: "Riverside Pharmacy".to_string(),
        buyer_email: "orders@riverside.example".to_string(),
        items: vec![OrderItem {
            product_id: ProductId::new(),
            product_name: "Amoxicillin 500mg".to_string(),
            catalog_code: "0002-1433-80".to_string(),
            vendor_id,
            vendor_name: "Acme Wholesale".to_string(),
            quantity: 1,
            unit_price: 1000,
            line_total: 1000,
        }],
        vendor_orders: vec![VendorOrderSeed {
            vendor_id,
            vendor_name: "Acme Wholesale".to_string(),
            subtotal: 1000,
        }],
        subtotal: 1000,
        shipping_cost: 0,
        tax: 80,
        total: 1080,
        shipping_address: test_address(),
        payment_method: PaymentMethod::Check,
        note: None,
    };

    let number = OrderNumber::parse("KQD4821VM").unwrap();
    let first = Order::create(
        vendora_core::OrderId::new(),
        number.clone(),
        seed(BuyerId::new()),
        Utc::now(),
    )
    .unwrap();
    let second = Order::create(
        vendora_core::OrderId::new(),
        number,
        seed(BuyerId::new()),
        Utc::now(),
    )
    .unwrap();

    h.orders.insert(first).unwrap();
    let err = h.orders.insert(second).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Duplicate {
            field: "order_number",
            ..
        }
    ));
}

#[test]
fn fulfillment_flow_ships_and_delivers_one_vendor_at_a_time() {
    let h = harness();
    let buyer_id = seed_buyer(&h);
    let v1 = VendorId::new();
    let v2 = VendorId::new();
    let p1 = seed_product(&h, v1, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);
    let p2 = seed_product(&h, v2, "Beta Distributors", "50580-449-05", "Ibuprofen 200mg", 2000, 1);
    put_in_cart(&h, buyer_id, p1, 3);
    put_in_cart(&h, buyer_id, p2, 1);

    let order = h.committer.commit(buyer_id, request(), Utc::now()).unwrap();
    let order_id = order.id_typed();
    let events = h.bus.subscribe();

    // Vendor 1 ships straight from pending with tracking data.
    let shipped = h
        .fulfillment
        .update_status(
            order_id,
            StatusChange {
                vendor_id: Some(v1),
                status: FulfillmentStatus::Shipped,
                actor_id: ActorId::new(),
                actor_kind: ActorKind::Vendor,
                tracking_number: Some("1Z999AA10123456784".to_string()),
                carrier: Some("UPS".to_string()),
                note: None,
                occurred_at: Utc::now(),
            },
        )
        .unwrap();
    assert_eq!(shipped.status(), OrderStatus::PartiallyShipped);
    let shipped_at = shipped.vendor_order(v1).unwrap().shipped_at().unwrap();

    // Later delivery leaves shipped_at untouched.
    let delivered = h
        .fulfillment
        .update_status(
            order_id,
            StatusChange {
                vendor_id: Some(v1),
                status: FulfillmentStatus::Delivered,
                actor_id: ActorId::new(),
                actor_kind: ActorKind::Vendor,
                tracking_number: None,
                carrier: None,
                note: None,
                occurred_at: Utc::now(),
            },
        )
        .unwrap();
    let vendor = delivered.vendor_order(v1).unwrap();
    assert_eq!(vendor.shipped_at().unwrap(), shipped_at);
    assert!(vendor.delivered_at().is_some());
    assert_eq!(vendor.tracking_number(), Some("1Z999AA10123456784"));

    // The persisted record reflects every transition plus history.
    let stored = h.orders.get(order_id).unwrap().unwrap();
    assert_eq!(stored.order.history().len(), 3);

    let first = events.try_recv().unwrap();
    assert_eq!(first.topic(), "order.status_updated");
}

#[test]
fn whole_order_cancellation_requires_no_vendor_id() {
    let h = harness();
    let buyer_id = seed_buyer(&h);
    let v = VendorId::new();
    let product_id = seed_product(&h, v, "Acme Wholesale", "0002-1433-80", "Amoxicillin 500mg", 1000, 5);
    put_in_cart(&h, buyer_id, product_id, 1);

    let order = h.committer.commit(buyer_id, request(), Utc::now()).unwrap();

    let cancelled = h
        .fulfillment
        .update_status(
            order.id_typed(),
            StatusChange {
                vendor_id: None,
                status: FulfillmentStatus::Cancelled,
                actor_id: ActorId::new(),
                actor_kind: ActorKind::Buyer,
                tracking_number: None,
                carrier: None,
                note: Some("ordered by mistake".to_string()),
                occurred_at: Utc::now(),
            },
        )
        .unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    // Non-cancel updates without a vendor id are rejected.
    let err = h
        .fulfillment
        .update_status(
            order.id_typed(),
            StatusChange {
                vendor_id: None,
                status: FulfillmentStatus::Confirmed,
                actor_id: ActorId::new(),
                actor_kind: ActorKind::Admin,
                tracking_number: None,
                carrier: None,
                note: None,
                occurred_at: Utc::now(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        crate::fulfillment::FulfillmentError::Domain(_)
    ));
}
