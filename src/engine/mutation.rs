//! Stock Mutation Engine
//!
//! Turns a cart into a fully validated write-set before anything is
//! mutated. Plans evaluate cart entries in insertion order and fail as a
//! whole on the first conflict, so a rejected plan leaves the catalog
//! untouched. The snapshot handed in must be the freshest one available;
//! cart-time stock values are display-only.

use uuid::Uuid;

use crate::domain::aggregates::cart::{PurchaseCart, RestockCart};
use crate::domain::aggregates::catalog::ItemCatalog;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockWrite {
    pub item_id: Uuid,
    pub prev_stock: i32,
    pub new_stock: i32,
}

/// Mapping of item id to its new stock value, in cart entry order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSet {
    writes: Vec<StockWrite>,
}

impl WriteSet {
    fn push(&mut self, write: StockWrite) { self.writes.push(write); }

    pub fn writes(&self) -> &[StockWrite] { &self.writes }

    pub fn new_stock_for(&self, item_id: Uuid) -> Option<i32> {
        self.writes.iter().find(|w| w.item_id == item_id).map(|w| w.new_stock)
    }

    pub fn len(&self) -> usize { self.writes.len() }
    pub fn is_empty(&self) -> bool { self.writes.is_empty() }

    /// Applies the plan to a catalog. All entries were validated when the
    /// plan was built, so this only fails if the catalog diverged since.
    pub fn apply(&self, catalog: &mut ItemCatalog) -> Result<()> {
        for write in &self.writes {
            if write.new_stock < 0 {
                return Err(Error::InvalidStock);
            }
            let mut item = catalog.get(write.item_id).map_err(|_| Error::StaleReference)?.clone();
            item.stock = write.new_stock;
            catalog.upsert(item)?;
        }
        Ok(())
    }
}

/// Plans a restock: `new = current + quantity` per entry. Fails only when an
/// item vanished from the snapshot or the sum leaves the stock range.
pub fn plan_restock(cart: &RestockCart, catalog: &ItemCatalog) -> Result<WriteSet> {
    let mut plan = WriteSet::default();
    for entry in cart.entries() {
        let item = catalog.get(entry.item_id).map_err(|_| Error::StaleReference)?;
        let new_stock = i32::try_from(i64::from(item.stock) + i64::from(entry.quantity))
            .map_err(|_| Error::InvalidStock)?;
        plan.push(StockWrite { item_id: item.id, prev_stock: item.stock, new_stock });
    }
    Ok(plan)
}

/// Plans a sale, re-checking every entry against the current snapshot. The
/// first entry (in insertion order) with insufficient stock fails the whole
/// plan.
pub fn plan_sale(cart: &PurchaseCart, catalog: &ItemCatalog) -> Result<WriteSet> {
    let mut plan = WriteSet::default();
    for entry in cart.entries() {
        let item = catalog.get(entry.item_id).map_err(|_| Error::StaleReference)?;
        if (item.stock as i64) < entry.quantity as i64 {
            return Err(Error::InsufficientStock {
                item_id: item.id,
                available: item.stock,
                requested: entry.quantity,
            });
        }
        plan.push(StockWrite {
            item_id: item.id,
            prev_stock: item.stock,
            new_stock: item.stock - entry.quantity as i32,
        });
    }
    Ok(plan)
}
