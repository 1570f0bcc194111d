//! Transaction Orchestrator
//!
//! Sequences full operations against the document store: validate against a
//! fresh catalog snapshot, build the write-set, commit stock mutations,
//! persist the sale/restock record, append an activity entry, and hand back
//! a receipt projection. Authorization is an explicit input to every call;
//! there is no ambient admin flag.
//!
//! Each transaction walks `Idle -> Validating -> Committing -> Committed`,
//! or drops to `Rejected` from `Validating`. Once `Committing` has begun the
//! transaction cannot be cancelled; a store failure there surfaces as
//! `TransactionFailed` with no rollback of writes already applied.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::domain::aggregates::cart::{PurchaseCart, RestockCart};
use crate::domain::aggregates::catalog::ItemCatalog;
use crate::domain::aggregates::item::{Item, ItemDraft};
use crate::domain::aggregates::sale::{CustomerDetails, Invoice, SaleRecord};
use crate::domain::events::{ActivityEntry, ActivityKind};
use crate::engine::metrics::{self, InventorySummary};
use crate::engine::mutation;
use crate::store::{Collection, DocumentStore, Namespace};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Admin,
}

/// Identity plus role for one dashboard session. The role is set by a
/// credential check outside this crate and passed in per call.
#[derive(Clone, Debug)]
pub struct Session {
    user_id: String,
    role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn viewer(user_id: impl Into<String>) -> Self { Self::new(user_id, Role::Viewer) }
    pub fn admin(user_id: impl Into<String>) -> Self { Self::new(user_id, Role::Admin) }

    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxPhase {
    #[default]
    Idle,
    Validating,
    Committing,
    Committed,
    Rejected,
}

/// Receipt projection for a committed restock.
#[derive(Clone, Debug, PartialEq)]
pub struct RestockReceipt {
    pub lines: Vec<RestockLine>,
    pub committed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RestockLine {
    pub item_id: Uuid,
    pub name: String,
    pub quantity_added: u32,
    pub prev_stock: i32,
    pub new_stock: i32,
}

pub struct Orchestrator {
    store: Arc<dyn DocumentStore>,
    app_id: String,
    phase: TxPhase,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn DocumentStore>, app_id: impl Into<String>) -> Self {
        Self { store, app_id: app_id.into(), phase: TxPhase::Idle }
    }

    pub fn phase(&self) -> TxPhase { self.phase }

    pub fn namespace(&self, session: &Session) -> Namespace {
        Namespace::new(&self.app_id, session.user_id())
    }

    fn transition(&mut self, to: TxPhase) {
        tracing::debug!(from = ?self.phase, to = ?to, "transaction phase");
        self.phase = to;
    }

    fn require_admin(&mut self, session: &Session) -> Result<()> {
        if session.is_admin() {
            Ok(())
        } else {
            self.transition(TxPhase::Rejected);
            self.transition(TxPhase::Idle);
            Err(Error::Unauthorized)
        }
    }

    fn reject(&mut self, err: Error) -> Error {
        self.transition(TxPhase::Rejected);
        self.transition(TxPhase::Idle);
        err
    }

    /// A store failure after `Committing` has begun. Writes already issued
    /// are not rolled back; the caller must re-check state.
    fn fail_commit(&mut self, err: Error) -> Error {
        tracing::error!(error = %err, "commit failed; partial effects may have been applied");
        self.transition(TxPhase::Idle);
        err
    }

    // =========================================================================
    // Item administration
    // =========================================================================

    pub async fn add_item(&mut self, session: &Session, draft: ItemDraft) -> Result<Item> {
        self.require_admin(session)?;
        let item = Item::create(draft)?;
        let ns = self.namespace(session);
        self.put_item(&ns, &item).await?;
        self.log_activity(
            &ns,
            ActivityEntry::new(
                ActivityKind::ItemAdded,
                format!("New item '{}' (SKU: {}) added.", item.name, item.sku),
                json!({
                    "itemId": item.id,
                    "itemName": item.name,
                    "sku": item.sku,
                    "stock": item.stock,
                }),
            ),
        )
        .await?;
        tracing::info!(item_id = %item.id, sku = %item.sku, "item added");
        Ok(item)
    }

    pub async fn update_item(&mut self, session: &Session, id: Uuid, draft: ItemDraft) -> Result<Item> {
        self.require_admin(session)?;
        let ns = self.namespace(session);
        let catalog = self.load_catalog(&ns).await?;
        let mut item = catalog.get(id)?.clone();
        item.apply_draft(draft)?;
        self.put_item(&ns, &item).await?;
        self.log_activity(
            &ns,
            ActivityEntry::new(
                ActivityKind::ItemUpdated,
                format!("Item '{}' (SKU: {}) updated.", item.name, item.sku),
                json!({ "itemId": item.id, "itemName": item.name, "sku": item.sku }),
            ),
        )
        .await?;
        tracing::info!(item_id = %item.id, "item updated");
        Ok(item)
    }

    pub async fn remove_item(&mut self, session: &Session, id: Uuid) -> Result<()> {
        self.require_admin(session)?;
        let ns = self.namespace(session);
        let catalog = self.load_catalog(&ns).await?;
        let item = catalog.get(id)?.clone();
        self.store
            .delete(&ns.path(Collection::Items), &id.to_string())
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        self.log_activity(
            &ns,
            ActivityEntry::new(
                ActivityKind::ItemRemoved,
                format!("Item '{}' (SKU: {}) removed.", item.name, item.sku),
                json!({ "itemId": item.id, "itemName": item.name, "sku": item.sku }),
            ),
        )
        .await?;
        tracing::info!(item_id = %id, "item removed");
        Ok(())
    }

    // =========================================================================
    // Restock transaction
    // =========================================================================

    pub async fn commit_restock(
        &mut self,
        session: &Session,
        cart: &mut RestockCart,
    ) -> Result<RestockReceipt> {
        self.transition(TxPhase::Validating);
        self.require_admin(session)?;
        if cart.is_empty() {
            return Err(self.reject(Error::InvalidInput("restock list is empty".into())));
        }

        let ns = self.namespace(session);
        let mut catalog = match self.load_catalog(&ns).await {
            Ok(catalog) => catalog,
            Err(err) => return Err(self.reject(err)),
        };
        let plan = match mutation::plan_restock(cart, &catalog) {
            Ok(plan) => plan,
            Err(err) => return Err(self.reject(err)),
        };

        self.transition(TxPhase::Committing);
        if let Err(err) = self.write_plan(&ns, &plan, &mut catalog).await {
            return Err(self.fail_commit(err));
        }

        // The plan was built from this cart, one write per entry in order.
        let lines: Vec<RestockLine> = cart
            .entries()
            .iter()
            .zip(plan.writes())
            .map(|(e, w)| RestockLine {
                item_id: e.item_id,
                name: e.name.clone(),
                quantity_added: e.quantity,
                prev_stock: w.prev_stock,
                new_stock: w.new_stock,
            })
            .collect();
        let description = format!(
            "Restocked items: {}.",
            lines
                .iter()
                .map(|l| format!("{} of {}", l.quantity_added, l.name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let details: Vec<_> = lines
            .iter()
            .map(|l| json!({ "itemId": l.item_id, "itemName": l.name, "quantityRestocked": l.quantity_added }))
            .collect();
        if let Err(err) = self
            .log_activity_committing(&ns, ActivityEntry::new(ActivityKind::StockUpdated, description, json!(details)))
            .await
        {
            return Err(self.fail_commit(err));
        }

        cart.clear();
        self.transition(TxPhase::Committed);
        self.transition(TxPhase::Idle);
        tracing::info!(lines = lines.len(), "restock committed");
        Ok(RestockReceipt { lines, committed_at: chrono::Utc::now() })
    }

    // =========================================================================
    // Sale transaction
    // =========================================================================

    pub async fn commit_sale(
        &mut self,
        session: &Session,
        customer: CustomerDetails,
        cart: &mut PurchaseCart,
    ) -> Result<Invoice> {
        self.transition(TxPhase::Validating);
        self.require_admin(session)?;
        if cart.is_empty() {
            return Err(self.reject(Error::InvalidInput("purchase list is empty".into())));
        }
        if let Err(err) = customer.check() {
            return Err(self.reject(err));
        }

        let ns = self.namespace(session);
        let mut catalog = match self.load_catalog(&ns).await {
            Ok(catalog) => catalog,
            Err(err) => return Err(self.reject(err)),
        };
        // Re-validate against the freshest snapshot, never the stock values
        // captured when entries were added to the cart.
        let plan = match mutation::plan_sale(cart, &catalog) {
            Ok(plan) => plan,
            Err(err) => return Err(self.reject(err)),
        };

        self.transition(TxPhase::Committing);
        if let Err(err) = self.write_plan(&ns, &plan, &mut catalog).await {
            return Err(self.fail_commit(err));
        }

        let record = SaleRecord::from_cart(customer, cart);
        let persist = async {
            let fields = serde_json::to_value(&record)
                .map_err(|e| Error::TransactionFailed(e.to_string()))?;
            self.store
                .write(&ns.path(Collection::Sales), &record.id.to_string(), fields)
                .await
                .map_err(|e| Error::TransactionFailed(e.to_string()))
        };
        if let Err(err) = persist.await {
            return Err(self.fail_commit(err));
        }

        let total = record.total_amount.clone();
        let activity = ActivityEntry::new(
            ActivityKind::SaleCompleted,
            format!(
                "Sale completed for {}. Total: \u{20b1}{}.",
                record.customer.name,
                total.amount()
            ),
            json!({
                "saleId": record.id,
                "customerName": record.customer.name,
                "totalAmount": total.amount(),
                "itemsSold": record
                    .lines
                    .iter()
                    .map(|l| json!({ "itemId": l.item_id, "quantity": l.quantity_sold, "price": l.price_at_sale.amount() }))
                    .collect::<Vec<_>>(),
            }),
        );
        if let Err(err) = self.log_activity_committing(&ns, activity).await {
            return Err(self.fail_commit(err));
        }

        let invoice = Invoice::from_sale(&record);
        cart.clear();
        self.transition(TxPhase::Committed);
        self.transition(TxPhase::Idle);
        tracing::info!(sale_id = %record.id, total = %total, "sale committed");
        Ok(invoice)
    }

    // =========================================================================
    // Read projections
    // =========================================================================

    /// Current catalog, ordered by creation time. Open to viewers.
    pub async fn items(&self, session: &Session) -> Result<Vec<Item>> {
        let ns = self.namespace(session);
        Ok(self.load_catalog(&ns).await?.snapshot().to_vec())
    }

    /// Persisted sales, most recent first. Open to viewers for display; the
    /// UI decides what to mask for non-admins.
    pub async fn recent_sales(&self, session: &Session) -> Result<Vec<SaleRecord>> {
        let ns = self.namespace(session);
        let docs = self
            .store
            .read(&ns.path(Collection::Sales))
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        let mut sales = Vec::with_capacity(docs.len());
        for doc in docs {
            let sale: SaleRecord = serde_json::from_value(doc.fields)
                .map_err(|e| Error::Store(format!("corrupt sale document {}: {e}", doc.id)))?;
            sales.push(sale);
        }
        sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(sales)
    }

    /// Activity log, most recent first. A store failure here degrades to an
    /// empty view instead of blocking the dashboard.
    pub async fn activity_log(&self, session: &Session) -> Vec<ActivityEntry> {
        let ns = self.namespace(session);
        let docs = match self.store.read(&ns.path(Collection::Activities)).await {
            Ok(docs) => docs,
            Err(err) => {
                tracing::warn!(error = %err, "activity log unavailable");
                return Vec::new();
            }
        };
        let mut entries: Vec<ActivityEntry> = docs
            .into_iter()
            .filter_map(|doc| serde_json::from_value(doc.fields).ok())
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub async fn summary(&self, session: &Session) -> Result<InventorySummary> {
        Ok(metrics::summarize(&self.items(session).await?))
    }

    pub async fn total_sales(&self, session: &Session) -> Result<crate::domain::value_objects::Money> {
        Ok(metrics::total_sales(&self.recent_sales(session).await?))
    }

    // =========================================================================
    // Store plumbing
    // =========================================================================

    async fn load_catalog(&self, ns: &Namespace) -> Result<ItemCatalog> {
        let docs = self
            .store
            .read(&ns.path(Collection::Items))
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            let item: Item = serde_json::from_value(doc.fields)
                .map_err(|e| Error::Store(format!("corrupt item document {}: {e}", doc.id)))?;
            items.push(item);
        }
        ItemCatalog::hydrate(items)
    }

    async fn put_item(&self, ns: &Namespace, item: &Item) -> Result<()> {
        let fields = serde_json::to_value(item).map_err(|e| Error::Store(e.to_string()))?;
        self.store
            .write(&ns.path(Collection::Items), &item.id.to_string(), fields)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    /// Applies a validated write-set to the catalog and pushes each updated
    /// item to the store. Errors here mean the commit already started;
    /// they surface as `TransactionFailed`.
    async fn write_plan(
        &self,
        ns: &Namespace,
        plan: &mutation::WriteSet,
        catalog: &mut ItemCatalog,
    ) -> Result<()> {
        plan.apply(catalog)
            .map_err(|e| Error::TransactionFailed(e.to_string()))?;
        for write in plan.writes() {
            let item = catalog
                .get(write.item_id)
                .map_err(|e| Error::TransactionFailed(e.to_string()))?;
            self.put_item(ns, item)
                .await
                .map_err(|e| Error::TransactionFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn log_activity(&self, ns: &Namespace, entry: ActivityEntry) -> Result<()> {
        let fields = serde_json::to_value(&entry).map_err(|e| Error::Store(e.to_string()))?;
        self.store
            .write(&ns.path(Collection::Activities), &entry.id.to_string(), fields)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn log_activity_committing(&self, ns: &Namespace, entry: ActivityEntry) -> Result<()> {
        self.log_activity(ns, entry)
            .await
            .map_err(|e| Error::TransactionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::item::ItemDraft;
    use crate::domain::value_objects::Money;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(MemoryStore::new()), "parts-pos")
    }

    fn draft(name: &str, stock: i32, reorder_level: i32) -> ItemDraft {
        ItemDraft {
            name: name.into(),
            description: format!("{name} description"),
            brand: "MotoParts".into(),
            stock,
            cost_price: Money::php(Decimal::new(150, 0)),
            selling_price: Money::php(Decimal::new(250, 0)),
            reorder_level,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "John Doe".into(),
            address: "123 Main St".into(),
            contact: "555-1234".into(),
            email: Some("john.doe@example.com".into()),
        }
    }

    #[tokio::test]
    async fn test_viewer_cannot_mutate() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let viewer = Session::viewer("u1");
        let item = orch.add_item(&admin, draft("Tire", 8, 10)).await.unwrap();

        let err = orch.add_item(&viewer, draft("Clutch", 5, 2)).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        let err = orch.remove_item(&viewer, item.id).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));

        let mut cart = PurchaseCart::new();
        cart.add(&item, 1).unwrap();
        let err = orch.commit_sale(&viewer, customer(), &mut cart).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        // Catalog untouched, cart kept.
        assert_eq!(orch.items(&admin).await.unwrap()[0].stock, 8);
        assert_eq!(cart.len(), 1);
        assert_eq!(orch.phase(), TxPhase::Idle);
    }

    #[tokio::test]
    async fn test_add_item_persists_and_logs() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Oil Filter", 50, 10)).await.unwrap();

        let items = orch.items(&admin).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);

        let log = orch.activity_log(&admin).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, ActivityKind::ItemAdded);
        assert!(log[0].description.contains("Oil Filter"));
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let err = orch.update_item(&admin, Uuid::new_v4(), draft("X", 1, 0)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn test_remove_twice_is_not_found() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Tire", 8, 10)).await.unwrap();
        orch.remove_item(&admin, item.id).await.unwrap();
        let err = orch.remove_item(&admin, item.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn test_restock_applies_aggregated_quantity_once() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Tire", 8, 10)).await.unwrap();

        let mut cart = RestockCart::new();
        cart.add(&item, 5).unwrap();
        cart.add(&item, 3).unwrap();
        let receipt = orch.commit_restock(&admin, &mut cart).await.unwrap();

        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].quantity_added, 8);
        assert_eq!(receipt.lines[0].prev_stock, 8);
        assert_eq!(receipt.lines[0].new_stock, 16);
        assert!(cart.is_empty());
        assert_eq!(orch.items(&admin).await.unwrap()[0].stock, 16);

        let log = orch.activity_log(&admin).await;
        assert_eq!(log[0].kind, ActivityKind::StockUpdated);
        assert!(log[0].description.contains("8 of Tire"));
    }

    #[tokio::test]
    async fn test_sell_through_scenario() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Item A", 10, 5)).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add(&item, 10).unwrap();
        let invoice = orch.commit_sale(&admin, customer(), &mut cart).await.unwrap();
        assert_eq!(invoice.total_amount.amount(), Decimal::new(2500, 0));
        assert!(cart.is_empty());

        let summary = orch.summary(&admin).await.unwrap();
        assert_eq!(summary.stock_out_items, 1);
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(orch.items(&admin).await.unwrap()[0].stock, 0);

        // One more unit cannot be sold; stock stays at zero.
        let stale = item.clone();
        let mut cart = PurchaseCart::new();
        cart.add(&stale, 1).unwrap();
        let err = orch.commit_sale(&admin, customer(), &mut cart).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientStock { available: 0, requested: 1, item_id } if item_id == item.id
        ));
        assert_eq!(orch.items(&admin).await.unwrap()[0].stock, 0);
        assert_eq!(cart.len(), 1); // rejected commits keep the cart
    }

    #[tokio::test]
    async fn test_failed_sale_leaves_catalog_unchanged() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let a = orch.add_item(&admin, draft("A", 10, 5)).await.unwrap();
        let b = orch.add_item(&admin, draft("B", 1, 0)).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add(&a, 2).unwrap();
        cart.add(&b, 5).unwrap();
        assert!(orch.commit_sale(&admin, customer(), &mut cart).await.is_err());

        let items = orch.items(&admin).await.unwrap();
        assert_eq!(items.iter().find(|i| i.id == a.id).unwrap().stock, 10);
        assert_eq!(items.iter().find(|i| i.id == b.id).unwrap().stock, 1);
        assert!(orch.recent_sales(&admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_records_and_totals() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Oil Filter", 50, 10)).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add(&item, 2).unwrap();
        orch.commit_sale(&admin, customer(), &mut cart).await.unwrap();
        let mut cart = PurchaseCart::new();
        cart.add(&item, 1).unwrap();
        orch.commit_sale(&admin, customer(), &mut cart).await.unwrap();

        let sales = orch.recent_sales(&admin).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales[0].timestamp >= sales[1].timestamp);
        assert_eq!(
            orch.total_sales(&admin).await.unwrap().amount(),
            Decimal::new(750, 0)
        );

        let log = orch.activity_log(&admin).await;
        assert_eq!(log[0].kind, ActivityKind::SaleCompleted);
    }

    #[tokio::test]
    async fn test_empty_carts_rejected() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let mut restock = RestockCart::new();
        assert!(matches!(
            orch.commit_restock(&admin, &mut restock).await,
            Err(Error::InvalidInput(_))
        ));
        let mut purchase = PurchaseCart::new();
        assert!(matches!(
            orch.commit_sale(&admin, customer(), &mut purchase).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_customer_rejected_before_commit() {
        let mut orch = orchestrator();
        let admin = Session::admin("u1");
        let item = orch.add_item(&admin, draft("Tire", 8, 10)).await.unwrap();
        let mut cart = PurchaseCart::new();
        cart.add(&item, 1).unwrap();
        let mut bad = customer();
        bad.contact.clear();
        let err = orch.commit_sale(&admin, bad, &mut cart).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(orch.items(&admin).await.unwrap()[0].stock, 8);
    }

    #[tokio::test]
    async fn test_namespaces_isolate_users() {
        let mut orch = orchestrator();
        let admin_a = Session::admin("user-a");
        let admin_b = Session::admin("user-b");
        orch.add_item(&admin_a, draft("Tire", 8, 10)).await.unwrap();
        assert_eq!(orch.items(&admin_a).await.unwrap().len(), 1);
        assert!(orch.items(&admin_b).await.unwrap().is_empty());
    }
}
