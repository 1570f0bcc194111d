//! Metrics Deriver
//!
//! Pure recomputation over snapshots. Nothing in here mutates the catalog
//! and nothing is patched incrementally: every change notification triggers
//! a full re-read and re-derive, which keeps the dashboard numbers from
//! drifting out of sync with the store.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::aggregates::item::Item;
use crate::domain::aggregates::sale::SaleRecord;
use crate::domain::value_objects::{Money, DEFAULT_CURRENCY};
use crate::store::{Collection, DocumentStore, Namespace};

#[derive(Clone, Debug, PartialEq)]
pub struct InventorySummary {
    pub total_items: usize,
    pub stock_out_items: usize,
    pub total_capital: Money,
    pub low_stock: Vec<Item>,
}

impl Default for InventorySummary {
    fn default() -> Self {
        Self {
            total_items: 0,
            stock_out_items: 0,
            total_capital: Money::zero(DEFAULT_CURRENCY),
            low_stock: Vec::new(),
        }
    }
}

/// Derives the dashboard summary from a catalog snapshot.
pub fn summarize(snapshot: &[Item]) -> InventorySummary {
    let currency = snapshot
        .first()
        .map(|i| i.cost_price.currency().to_string())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let mut total_items = 0;
    let mut stock_out_items = 0;
    let mut total_capital = Money::zero(&currency);
    let mut low_stock = Vec::new();
    for item in snapshot {
        total_items += 1;
        if item.is_stock_out() {
            stock_out_items += 1;
        }
        let capital = item.cost_price.multiply(item.stock.max(0) as u32);
        match total_capital.add(&capital) {
            Ok(sum) => total_capital = sum,
            Err(err) => {
                tracing::warn!(item_id = %item.id, error = %err, "item excluded from capital total")
            }
        }
        if item.is_low_stock() {
            low_stock.push(item.clone());
        }
    }
    InventorySummary { total_items, stock_out_items, total_capital, low_stock }
}

/// Sum of `total_amount` over all persisted sale records.
pub fn total_sales(sales: &[SaleRecord]) -> Money {
    let currency = sales
        .first()
        .map(|s| s.total_amount.currency().to_string())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    sales.iter().fold(Money::zero(&currency), |acc, s| {
        match acc.add(&s.total_amount) {
            Ok(sum) => sum,
            Err(err) => {
                tracing::warn!(sale_id = %s.id, error = %err, "sale excluded from total");
                acc
            }
        }
    })
}

/// Spawns a task that recomputes the inventory summary on every change to
/// the items collection. Feed failures degrade to the last good summary;
/// they never block stock operations.
pub fn spawn_summary_feed(
    store: Arc<dyn DocumentStore>,
    namespace: &Namespace,
) -> watch::Receiver<InventorySummary> {
    let (tx, rx) = watch::channel(InventorySummary::default());
    let path = namespace.path(Collection::Items);
    let mut changes = store.subscribe(&path);
    tokio::spawn(async move {
        loop {
            match read_items(store.as_ref(), &path).await {
                Ok(items) => {
                    if tx.send(summarize(&items)).is_err() {
                        break; // nobody is watching anymore
                    }
                }
                Err(err) => tracing::warn!(%path, error = %err, "summary recompute skipped"),
            }
            match changes.recv().await {
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(%path, missed, "summary feed lagged; recomputing from snapshot");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    rx
}

async fn read_items(store: &dyn DocumentStore, path: &str) -> crate::Result<Vec<Item>> {
    let docs = store.read(path).await.map_err(|e| crate::Error::Store(e.to_string()))?;
    let mut items = Vec::with_capacity(docs.len());
    for doc in docs {
        let item: Item = serde_json::from_value(doc.fields)
            .map_err(|e| crate::Error::Store(format!("corrupt item document {}: {e}", doc.id)))?;
        items.push(item);
    }
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(items)
}
