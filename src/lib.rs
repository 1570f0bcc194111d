//! Stockledger Inventory Transaction Engine
//!
//! Core logic for a point-of-sale / inventory dashboard.
//!
//! ## Features
//! - Item catalog with stock tracking and low-stock detection
//! - Restock and purchase carts with quantity aggregation
//! - Validate-then-apply stock mutations (all-or-nothing write-sets)
//! - Transaction orchestration against an injected document store
//! - Derived inventory and sales metrics, recomputed per snapshot

use thiserror::Error;
use uuid::Uuid;

pub mod domain;
pub mod engine;
pub mod seed;
pub mod store;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    #[error("stock value out of range")]
    InvalidStock,

    #[error("item not found")]
    NotFound,

    #[error("item no longer exists in the catalog")]
    StaleReference,

    #[error("insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: Uuid,
        available: i32,
        requested: u32,
    },

    #[error("administrator session required")]
    Unauthorized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
