//! Stockledger - Point-of-sale inventory dashboard demo
//!
//! Wires the transaction engine to the in-memory document store, seeds the
//! demo catalog, and runs a restock plus a sale end to end.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockledger::domain::aggregates::cart::{PurchaseCart, RestockCart};
use stockledger::domain::aggregates::sale::CustomerDetails;
use stockledger::engine::orchestrator::{Orchestrator, Session};
use stockledger::engine::metrics;
use stockledger::seed;
use stockledger::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app_id = std::env::var("APP_ID").unwrap_or_else(|_| "parts-pos".to_string());
    let user_id = std::env::var("USER_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    let admin = Session::admin(&user_id);

    let store = Arc::new(MemoryStore::new());
    let mut orch = Orchestrator::new(store.clone(), &app_id);
    let namespace = orch.namespace(&admin);
    let mut summary_feed = metrics::spawn_summary_feed(store.clone(), &namespace);

    seed::ensure_seed_data(store.as_ref(), &namespace).await?;

    let items = orch.items(&admin).await?;
    for item in &items {
        tracing::info!(sku = %item.sku, name = %item.name, stock = item.stock, "catalog item");
    }

    // Restock the low items.
    let mut restock = RestockCart::new();
    for item in items.iter().filter(|i| i.is_low_stock()) {
        restock.add(item, 10)?;
    }
    if !restock.is_empty() {
        let receipt = orch.commit_restock(&admin, &mut restock).await?;
        for line in &receipt.lines {
            tracing::info!(name = %line.name, added = line.quantity_added, new_stock = line.new_stock, "restocked");
        }
    }

    // Sell two oil filters to a walk-in customer.
    let items = orch.items(&admin).await?;
    let mut cart = PurchaseCart::new();
    if let Some(filter) = items.iter().find(|i| i.name.contains("Oil Filter")) {
        cart.add_sale(filter, 2)?;
    }
    if !cart.is_empty() {
        let invoice = orch
            .commit_sale(
                &admin,
                CustomerDetails {
                    name: "Walk-in Customer".into(),
                    address: "N/A".into(),
                    contact: "000-0000".into(),
                    email: None,
                },
                &mut cart,
            )
            .await?;
        tracing::info!(sale_id = %invoice.sale_id, total = %invoice.total_amount, "invoice ready");
    }

    summary_feed.changed().await.ok();
    let summary = summary_feed.borrow().clone();
    tracing::info!(
        total_items = summary.total_items,
        stock_out = summary.stock_out_items,
        capital = %summary.total_capital,
        low_stock = summary.low_stock.len(),
        "inventory summary"
    );
    tracing::info!(total_sales = %orch.total_sales(&admin).await?, "sales to date");

    for entry in orch.activity_log(&admin).await {
        tracing::info!(kind = ?entry.kind, "{}", entry.description);
    }

    Ok(())
}
