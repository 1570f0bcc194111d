//! One-time seed data bootstrap
//!
//! Idempotent: runs only when the items collection is empty, outside the
//! transaction engine's hot path. Gives a fresh namespace the demo
//! motorcycle-parts catalog and one historical sale.

use rust_decimal::Decimal;

use crate::domain::aggregates::cart::PurchaseCart;
use crate::domain::aggregates::item::{Item, ItemDraft};
use crate::domain::aggregates::sale::{CustomerDetails, SaleRecord};
use crate::domain::value_objects::Money;
use crate::store::{Collection, DocumentStore, Namespace};
use crate::{Error, Result};

struct SeedItem {
    name: &'static str,
    description: &'static str,
    brand: &'static str,
    stock: i32,
    cost_price: i64,
    selling_price: i64,
    reorder_level: i32,
}

const SEED_ITEMS: [SeedItem; 4] = [
    SeedItem {
        name: "Oil Filter (Dummy)",
        description: "Standard oil filter for motorcycles",
        brand: "MotoParts",
        stock: 50,
        cost_price: 150,
        selling_price: 250,
        reorder_level: 10,
    },
    SeedItem {
        name: "Spark Plug (Dummy)",
        description: "High-performance spark plug",
        brand: "NGK",
        stock: 0,
        cost_price: 80,
        selling_price: 120,
        reorder_level: 5,
    },
    SeedItem {
        name: "Brake Pad Set (Dummy)",
        description: "Front brake pad set",
        brand: "BrakePro",
        stock: 25,
        cost_price: 400,
        selling_price: 650,
        reorder_level: 20,
    },
    SeedItem {
        name: "Tire (Dummy)",
        description: "Motorcycle rear tire",
        brand: "TireX",
        stock: 8,
        cost_price: 1200,
        selling_price: 1800,
        reorder_level: 10,
    },
];

/// Seeds the namespace if its items collection is empty. Returns whether
/// anything was written.
pub async fn ensure_seed_data(store: &dyn DocumentStore, namespace: &Namespace) -> Result<bool> {
    let items_path = namespace.path(Collection::Items);
    let existing = store
        .read(&items_path)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;
    if !existing.is_empty() {
        return Ok(false);
    }

    tracing::info!("no items found, seeding demo data");
    let mut seeded = Vec::with_capacity(SEED_ITEMS.len());
    for seed in &SEED_ITEMS {
        let item = Item::create(ItemDraft {
            name: seed.name.into(),
            description: seed.description.into(),
            brand: seed.brand.into(),
            stock: seed.stock,
            cost_price: Money::php(Decimal::new(seed.cost_price, 0)),
            selling_price: Money::php(Decimal::new(seed.selling_price, 0)),
            reorder_level: seed.reorder_level,
        })?;
        let fields = serde_json::to_value(&item).map_err(|e| Error::Store(e.to_string()))?;
        store
            .write(&items_path, &item.id.to_string(), fields)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        seeded.push(item);
    }

    let sales_path = namespace.path(Collection::Sales);
    let sales = store
        .read(&sales_path)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;
    if sales.is_empty() {
        // 2 x Oil Filter + 1 x Brake Pad Set, as in the demo dataset.
        let mut cart = PurchaseCart::new();
        cart.add(&seeded[0], 2)?;
        cart.add(&seeded[2], 1)?;
        let sale = SaleRecord::from_cart(
            CustomerDetails {
                name: "John Doe".into(),
                address: "123 Main St".into(),
                contact: "555-1234".into(),
                email: Some("john.doe@example.com".into()),
            },
            &cart,
        );
        let fields = serde_json::to_value(&sale).map_err(|e| Error::Store(e.to_string()))?;
        store
            .write(&sales_path, &sale.id.to_string(), fields)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
    }

    Ok(true)
}
