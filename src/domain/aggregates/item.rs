//! Item Aggregate
//!
//! A stock-keeping unit tracked by the catalog. Stock is stored as `i32`
//! and must never go negative; `stock <= reorder_level` marks low stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{Money, Sku};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub sku: Sku,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub stock: i32,
    pub cost_price: Money,
    pub selling_price: Money,
    pub reorder_level: i32,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Builds a new item from a validated draft, generating id and SKU.
    pub fn create(draft: ItemDraft) -> Result<Self> {
        draft.check()?;
        Ok(Self {
            id: Uuid::new_v4(),
            sku: Sku::generate(),
            name: draft.name,
            description: draft.description,
            brand: draft.brand,
            stock: draft.stock,
            cost_price: draft.cost_price,
            selling_price: draft.selling_price,
            reorder_level: draft.reorder_level,
            created_at: Utc::now(),
        })
    }

    /// Applies an edit, keeping identity, SKU and creation time.
    pub fn apply_draft(&mut self, draft: ItemDraft) -> Result<()> {
        draft.check()?;
        self.name = draft.name;
        self.description = draft.description;
        self.brand = draft.brand;
        self.stock = draft.stock;
        self.cost_price = draft.cost_price;
        self.selling_price = draft.selling_price;
        self.reorder_level = draft.reorder_level;
        Ok(())
    }

    pub fn is_stock_out(&self) -> bool { self.stock == 0 }
    pub fn is_low_stock(&self) -> bool { self.stock <= self.reorder_level }

    /// Case-insensitive match on name, SKU or brand, used by inventory
    /// search and the restock picker.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.sku.as_str().to_lowercase().contains(&q)
            || self.brand.to_lowercase().contains(&q)
    }
}

/// Input shape for creating or editing an item.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ItemDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "brand is required"))]
    pub brand: String,
    pub stock: i32,
    pub cost_price: Money,
    pub selling_price: Money,
    pub reorder_level: i32,
}

impl ItemDraft {
    fn check(&self) -> Result<()> {
        self.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        if self.stock < 0 { return Err(Error::InvalidStock); }
        if self.reorder_level < 0 {
            return Err(Error::InvalidInput("reorder level cannot be negative".into()));
        }
        if self.cost_price.is_negative() || self.selling_price.is_negative() {
            return Err(Error::InvalidInput("prices cannot be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_item(name: &str, stock: i32, reorder_level: i32) -> Item {
    use rust_decimal::Decimal;

    Item::create(ItemDraft {
        name: name.into(),
        description: format!("{name} description"),
        brand: "TestBrand".into(),
        stock,
        cost_price: Money::php(Decimal::new(100, 0)),
        selling_price: Money::php(Decimal::new(150, 0)),
        reorder_level,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_generates_identity() {
        let item = test_item("Oil Filter", 50, 10);
        assert!(item.sku.as_str().starts_with("SKU-"));
        assert_eq!(item.stock, 50);
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut item = test_item("Tire", 8, 10);
        assert!(item.is_low_stock());
        item.stock = 10;
        assert!(item.is_low_stock()); // stock == reorder_level is low
        item.stock = 11;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_stock_out() {
        let mut item = test_item("Spark Plug", 0, 5);
        assert!(item.is_stock_out());
        item.stock = 1;
        assert!(!item.is_stock_out());
    }

    #[test]
    fn test_draft_rejects_negative_stock() {
        let draft = ItemDraft {
            name: "X".into(), description: "d".into(), brand: "b".into(),
            stock: -1, cost_price: Money::default(), selling_price: Money::default(),
            reorder_level: 0,
        };
        assert!(matches!(Item::create(draft), Err(Error::InvalidStock)));
    }

    #[test]
    fn test_draft_rejects_blank_name() {
        let draft = ItemDraft {
            name: "".into(), description: "d".into(), brand: "b".into(),
            stock: 0, cost_price: Money::default(), selling_price: Money::default(),
            reorder_level: 0,
        };
        assert!(matches!(Item::create(draft), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_search_matches() {
        let item = test_item("Brake Pad Set", 25, 20);
        assert!(item.matches("brake"));
        assert!(item.matches("testbrand"));
        assert!(item.matches("sku-"));
        assert!(!item.matches("clutch"));
    }
}
