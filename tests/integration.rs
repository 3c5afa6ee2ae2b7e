//! Integration tests for the hub: catalog sync, cart and checkout together.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vendor_hub::{
    CartStore, Catalog, CatalogConfig, CatalogItem, CatalogSyncManager, CheckoutDispatcher,
    ContactHandle, DispatchChannel, HubConfig, InMemorySource, ItemId, Result, SubscribeOptions,
    Vendor, VendorId, WhatsAppChannel,
};

/// Channel that keeps every message it is asked to send.
#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl DispatchChannel for Outbox {
    fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()> {
        self.sent
            .lock()
            .push((contact.as_str().to_string(), payload.to_string()));
        Ok(())
    }
}

fn vendor(id: &str, name: &str, handle: &str) -> Vendor {
    Vendor {
        id: VendorId::new(id),
        name: name.to_string(),
        category: "Mercado".to_string(),
        rating: 4.5,
        contact_handle: handle.to_string(),
        description: None,
        phone: None,
        logo: None,
    }
}

fn item(id: &str, vendor: &str, name: &str, cents: i64) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(id),
        vendor_id: VendorId::new(vendor),
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        category: String::new(),
        image: None,
        description: None,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn seeded_source() -> Arc<InMemorySource> {
    init_tracing();
    let source = Arc::new(InMemorySource::new());
    let stores = [
        ("s1", "Padaria Central", 4.8, "55 88 91111-0000"),
        ("s2", "Mercadinho Sol", 4.1, "55 88 92222-0000"),
        ("s3", "Bolos da Ana", 3.2, ""),
    ];
    for (id, name, rating, whatsapp) in stores {
        source
            .put_json(
                "stores",
                id,
                json!({"name": name, "category": "Comida", "rating": rating, "whatsapp": whatsapp}),
            )
            .unwrap();
    }
    source
        .put_json("products", "p1", json!({"storeId": "s1", "name": "Pão", "price": 0.5}))
        .unwrap();
    source
        .put_json("products", "p2", json!({"storeId": "s1", "name": "Bolo", "price": 20}))
        .unwrap();
    source
        .put_json("products", "p3", json!({"storeId": "s2", "name": "Arroz", "price": 7.99}))
        .unwrap();
    source
}

// --- Checkout Scenarios ---

#[test]
fn test_two_vendor_checkout_totals() {
    let cart = CartStore::new();
    let x = vendor("x", "X", "5588911110000");
    let y = vendor("y", "Y", "5588922220000");

    cart.add(item("a", "x", "A", 1000), x.clone()).unwrap();
    cart.add(item("a", "x", "A", 1000), x.clone()).unwrap();
    cart.add(item("b", "x", "B", 550), x).unwrap();
    for _ in 0..4 {
        cart.add(item("c", "y", "C", 300), y.clone()).unwrap();
    }

    assert_eq!(cart.total(), Decimal::new(3750, 2));

    let dispatcher = CheckoutDispatcher::new(Outbox::default());
    let report = dispatcher.checkout(&cart);

    assert_eq!(report.orders.len(), 2);
    let x_order = report.order_for(&VendorId::new("x")).unwrap();
    assert_eq!(x_order.lines.len(), 2);
    assert_eq!(x_order.order_total, Decimal::new(2550, 2));
    let y_order = report.order_for(&VendorId::new("y")).unwrap();
    assert_eq!(y_order.lines.len(), 1);
    assert_eq!(y_order.order_total, Decimal::new(1200, 2));
    assert_eq!(report.total(), Decimal::new(3750, 2));
    assert!(report.is_complete());
    assert!(cart.is_empty());

    let sent = dispatcher.channel().sent.lock();
    assert!(sent[0].1.contains("2x A - R$ 20.00\n1x B - R$ 5.50\n"));
    assert!(sent[0].1.contains("Total: R$ 25.50"));
    assert!(sent[1].1.contains("4x C - R$ 12.00\n\nTotal: R$ 12.00"));
}

#[test]
fn test_repeated_add_increments() {
    let cart = CartStore::new();
    let x = vendor("x", "X", "5588911110000");
    for expected in 1..=3 {
        let quantity = cart.add(item("a", "x", "A", 100), x.clone()).unwrap();
        assert_eq!(quantity, expected);
    }
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(&ItemId::new("a")).unwrap().quantity, 3);
}

#[test]
fn test_whatsapp_checkout_opens_one_link_per_vendor() {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&opened);
    let channel = WhatsAppChannel::new(move |url: &str| -> Result<()> {
        log.lock().push(url.to_string());
        Ok(())
    });

    let cart = CartStore::new();
    cart.add(item("a", "x", "A", 100), vendor("x", "X", "+55 (88) 91111-0000"))
        .unwrap();
    cart.add(item("b", "y", "B", 200), vendor("y", "Y", "5588922220000"))
        .unwrap();

    let report = CheckoutDispatcher::new(channel).checkout(&cart);
    assert!(report.is_complete());

    let opened = opened.lock();
    assert_eq!(opened.len(), 2);
    assert!(opened[0].starts_with("https://wa.me/5588911110000?text="));
    assert!(opened[1].starts_with("https://wa.me/5588922220000?text="));
    assert!(opened[0].contains("1x%20A%20-%20R%24%201.00"));
}

// --- Live Catalog ---

#[test]
fn test_top_vendors_stay_sorted_after_remote_change() {
    let source = seeded_source();
    let catalog = Catalog::new(
        CatalogSyncManager::new(source.clone()),
        CatalogConfig::default(),
    );

    let top = catalog.top_vendors(2);
    assert!(top.wait_loaded(Duration::from_secs(1)));
    let names: Vec<String> = top.snapshot().iter().map(|v| v.name.clone()).collect();
    assert_eq!(names, vec!["Padaria Central", "Mercadinho Sol"]);

    source
        .update_field("stores", "s3", "rating", json!(5.0))
        .unwrap();

    let names: Vec<String> = top.snapshot().iter().map(|v| v.name.clone()).collect();
    assert_eq!(names, vec!["Bolos da Ana", "Padaria Central"]);
    let ratings: Vec<f64> = top.snapshot().iter().map(|v| v.rating).collect();
    assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_catalog_to_cart_to_checkout() {
    let source = seeded_source();
    let catalog = Catalog::new(
        CatalogSyncManager::new(source.clone()),
        CatalogConfig::default(),
    );

    let vendors = catalog.vendors();
    let padaria = vendors.get("s1").unwrap();
    let items = catalog.vendor_items(&padaria.id);
    assert_eq!(items.len(), 2);

    let cart = CartStore::new();
    for product in items.snapshot().iter() {
        cart.add(product.clone(), padaria.clone()).unwrap();
    }
    let mercado = vendors.get("s2").unwrap();
    let arroz = catalog.vendor_items(&mercado.id).snapshot()[0].clone();
    cart.add(arroz.clone(), mercado.clone()).unwrap();
    cart.add(arroz, mercado).unwrap();

    // Price edits after adding do not reach the cart.
    source
        .update_field("products", "p1", "price", json!(9.0))
        .unwrap();
    assert_eq!(cart.total(), Decimal::new(3648, 2));

    let dispatcher = CheckoutDispatcher::new(Outbox::default());
    let report = dispatcher.checkout(&cart);
    assert_eq!(report.dispatched().len(), 2);
    assert_eq!(
        report.order_for(&VendorId::new("s2")).unwrap().order_total,
        Decimal::new(1598, 2)
    );
    assert!(cart.is_empty());
}

#[test]
fn test_shared_feed_and_release() {
    let source = seeded_source();
    let manager = CatalogSyncManager::new(source.clone());

    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);
    let first = manager.subscribe::<Vendor, _>(
        "stores",
        SubscribeOptions::new().descending("rating"),
        move |_| *counter.lock() += 1,
    );
    let second = manager.subscribe::<Vendor, _>(
        "stores",
        SubscribeOptions::new().descending("rating"),
        |_| {},
    );
    assert_eq!(source.feed_count(), 1);
    assert_eq!(*seen.lock(), 1);

    manager.unsubscribe(&first);
    source
        .put_json("stores", "s4", json!({"name": "Nova", "rating": 1}))
        .unwrap();
    assert_eq!(*seen.lock(), 1);
    assert_eq!(source.feed_count(), 1);

    manager.unsubscribe(&second);
    assert_eq!(source.feed_count(), 0);
}

#[test]
fn test_config_drives_collections_and_wording() {
    let config = HubConfig::from_json_str(
        r#"{
            "catalog": {"vendors": "lojas", "featuredVendors": 1},
            "checkout": {"currency": "BRL", "greeting": "Pedido:"}
        }"#,
    )
    .unwrap();

    let source = Arc::new(InMemorySource::new());
    source
        .put_json("lojas", "l1", json!({"name": "Loja 1", "rating": 2}))
        .unwrap();
    source
        .put_json("lojas", "l2", json!({"name": "Loja 2", "rating": 3}))
        .unwrap();

    let catalog = Catalog::new(CatalogSyncManager::new(source), config.catalog);
    let featured = catalog.featured_vendors();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured.snapshot()[0].name, "Loja 2");

    let cart = CartStore::new();
    cart.add(item("a", "x", "A", 100), vendor("x", "X", "5588911110000"))
        .unwrap();
    let dispatcher = CheckoutDispatcher::with_config(Outbox::default(), config.checkout);
    dispatcher.checkout(&cart);
    let sent = dispatcher.channel().sent.lock();
    assert!(sent[0].1.starts_with("Pedido:\n\n1x A - BRL 1.00\n"));
}
