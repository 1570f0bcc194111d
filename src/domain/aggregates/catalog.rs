//! Item Catalog
//!
//! In-memory authority for stock-keeping units. Only write-sets produced by
//! the mutation planner may change `stock`; every mutation path goes through
//! `upsert` which rejects negative stock.

use uuid::Uuid;

use crate::domain::aggregates::item::Item;
use crate::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: Vec<Item>,
}

impl ItemCatalog {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a catalog from persisted items, ordered by creation time.
    pub fn hydrate(mut items: Vec<Item>) -> Result<Self> {
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut catalog = Self::new();
        for item in items {
            catalog.upsert(item)?;
        }
        Ok(catalog)
    }

    /// Inserts a new item or replaces the one with the same id.
    pub fn upsert(&mut self, item: Item) -> Result<()> {
        if item.stock < 0 {
            return Err(Error::InvalidStock);
        }
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Removes an item. Repeated removal of the same id is an error, not a
    /// no-op.
    pub fn remove(&mut self, id: Uuid) -> Result<Item> {
        let pos = self.items.iter().position(|i| i.id == id).ok_or(Error::NotFound)?;
        Ok(self.items.remove(pos))
    }

    pub fn get(&self, id: Uuid) -> Result<&Item> {
        self.items.iter().find(|i| i.id == id).ok_or(Error::NotFound)
    }

    /// Current snapshot, in insertion order.
    pub fn snapshot(&self) -> &[Item] { &self.items }

    pub fn search(&self, query: &str) -> Vec<&Item> {
        self.items.iter().filter(|i| i.matches(query)).collect()
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::item::test_item;

    #[test]
    fn test_upsert_and_get() {
        let mut catalog = ItemCatalog::new();
        let item = test_item("Oil Filter", 50, 10);
        let id = item.id;
        catalog.upsert(item).unwrap();
        assert_eq!(catalog.get(id).unwrap().name, "Oil Filter");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut catalog = ItemCatalog::new();
        let mut item = test_item("Tire", 8, 10);
        let id = item.id;
        catalog.upsert(item.clone()).unwrap();
        item.stock = 20;
        catalog.upsert(item).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(id).unwrap().stock, 20);
    }

    #[test]
    fn test_upsert_rejects_negative_stock() {
        let mut catalog = ItemCatalog::new();
        let mut item = test_item("Tire", 8, 10);
        item.stock = -1;
        assert!(matches!(catalog.upsert(item), Err(Error::InvalidStock)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_remove_twice_is_not_found() {
        let mut catalog = ItemCatalog::new();
        let item = test_item("Spark Plug", 0, 5);
        let id = item.id;
        catalog.upsert(item).unwrap();
        assert!(catalog.remove(id).is_ok());
        assert!(matches!(catalog.remove(id), Err(Error::NotFound)));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let catalog = ItemCatalog::new();
        assert!(matches!(catalog.get(Uuid::new_v4()), Err(Error::NotFound)));
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut catalog = ItemCatalog::new();
        let a = test_item("A", 1, 0);
        let b = test_item("B", 2, 0);
        catalog.upsert(a).unwrap();
        catalog.upsert(b).unwrap();
        let names: Vec<_> = catalog.snapshot().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_search() {
        let mut catalog = ItemCatalog::new();
        catalog.upsert(test_item("Oil Filter", 50, 10)).unwrap();
        catalog.upsert(test_item("Brake Pad Set", 25, 20)).unwrap();
        assert_eq!(catalog.search("brake").len(), 1);
        assert_eq!(catalog.search("testbrand").len(), 2);
        assert!(catalog.search("clutch").is_empty());
    }
}
