//! Aggregates module
pub mod cart;
pub mod catalog;
pub mod item;
pub mod sale;

pub use cart::{Cart, CartEntry, Purchase, PurchaseCart, Restock, RestockCart};
pub use catalog::ItemCatalog;
pub use item::{Item, ItemDraft};
pub use sale::{CustomerDetails, Invoice, SaleLine, SaleRecord};
