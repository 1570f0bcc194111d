//! Cart Aggregator
//!
//! One generic accumulation structure backing both the restock cart and the
//! purchase cart. Entries carry a denormalized snapshot of the item taken at
//! add time; nothing here touches the catalog. Stock sufficiency is decided
//! at commit time by the mutation planner against a fresh snapshot.

use std::marker::PhantomData;

use uuid::Uuid;

use crate::domain::aggregates::item::Item;
use crate::domain::value_objects::{Money, Sku, DEFAULT_CURRENCY};
use crate::{Error, Result};

/// Marker for a cart of quantities to add to stock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Restock;

/// Marker for a cart of quantities to sell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Purchase;

pub type RestockCart = Cart<Restock>;
pub type PurchaseCart = Cart<Purchase>;

#[derive(Clone, Debug, PartialEq)]
pub struct CartEntry {
    pub item_id: Uuid,
    pub name: String,
    pub sku: Sku,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartEntry {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cart<M> {
    entries: Vec<CartEntry>,
    _mode: PhantomData<M>,
}

impl<M> Default for Cart<M> {
    fn default() -> Self { Self { entries: Vec::new(), _mode: PhantomData } }
}

impl<M> Cart<M> {
    pub fn new() -> Self { Self::default() }

    /// Adds `quantity` of an item. Repeat additions of the same item are
    /// merged by summing quantities; the snapshot from the first addition
    /// is kept. A sum that leaves the quantity range is rejected.
    pub fn add(&mut self, item: &Item, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        match self.entries.iter_mut().find(|e| e.item_id == item.id) {
            Some(entry) => {
                entry.quantity =
                    entry.quantity.checked_add(quantity).ok_or(Error::InvalidQuantity)?;
            }
            None => self.entries.push(CartEntry {
                item_id: item.id,
                name: item.name.clone(),
                sku: item.sku.clone(),
                unit_price: item.selling_price.clone(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Removes the entry for an item if present; absent entries are a no-op.
    pub fn remove(&mut self, item_id: Uuid) {
        self.entries.retain(|e| e.item_id != item_id);
    }

    pub fn entries(&self) -> &[CartEntry] { &self.entries }

    pub fn quantity_of(&self, item_id: Uuid) -> u32 {
        self.entries.iter().find(|e| e.item_id == item_id).map_or(0, |e| e.quantity)
    }

    /// Sum of `quantity x unit price` across entries.
    pub fn total(&self) -> Money {
        let currency = self
            .entries
            .first()
            .map(|e| e.unit_price.currency().to_string())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        self.entries.iter().fold(Money::zero(&currency), |acc, e| {
            match acc.add(&e.line_total()) {
                Ok(sum) => sum,
                Err(err) => {
                    tracing::warn!(item_id = %e.item_id, error = %err, "cart line excluded from total");
                    acc
                }
            }
        })
    }

    pub fn clear(&mut self) { self.entries.clear(); }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Cart<Purchase> {
    /// Adds to a purchase cart with a courtesy check that the cumulative
    /// quantity does not exceed the stock seen right now. The authoritative
    /// re-check still happens at commit time.
    pub fn add_sale(&mut self, item: &Item, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        let pending = self.quantity_of(item.id);
        let requested = pending.checked_add(quantity).ok_or(Error::InvalidQuantity)?;
        if (item.stock as i64) < requested as i64 {
            return Err(Error::InsufficientStock {
                item_id: item.id,
                available: item.stock,
                requested,
            });
        }
        self.add(item, quantity)
    }
}
