//! Sale Aggregate
//!
//! Append-only record of a committed sale plus the denormalized invoice
//! projection handed to display/printing. Neither feeds back into stock
//! computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::cart::PurchaseCart;
use crate::domain::value_objects::{Money, Sku};
use crate::{Error, Result};

/// Customer contact bundle captured with every sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerDetails {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "customer address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "customer contact number is required"))]
    pub contact: String,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
}

impl CustomerDetails {
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|e| Error::InvalidInput(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub item_id: Uuid,
    pub name: String,
    pub sku: Sku,
    pub quantity_sold: u32,
    pub price_at_sale: Money,
    pub line_total: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Uuid,
    pub customer: CustomerDetails,
    pub lines: Vec<SaleLine>,
    pub total_amount: Money,
    pub timestamp: DateTime<Utc>,
}

impl SaleRecord {
    /// Snapshots a purchase cart into an immutable record, preserving entry
    /// order.
    pub fn from_cart(customer: CustomerDetails, cart: &PurchaseCart) -> Self {
        let lines = cart
            .entries()
            .iter()
            .map(|e| SaleLine {
                item_id: e.item_id,
                name: e.name.clone(),
                sku: e.sku.clone(),
                quantity_sold: e.quantity,
                price_at_sale: e.unit_price.clone(),
                line_total: e.line_total(),
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            customer,
            lines,
            total_amount: cart.total(),
            timestamp: Utc::now(),
        }
    }
}

/// Denormalized projection of a sale for display and printing, independent
/// of future catalog mutations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Invoice {
    pub sale_id: Uuid,
    pub customer: CustomerDetails,
    pub lines: Vec<InvoiceLine>,
    pub total_amount: Money,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl Invoice {
    pub fn from_sale(sale: &SaleRecord) -> Self {
        Self {
            sale_id: sale.id,
            customer: sale.customer.clone(),
            lines: sale
                .lines
                .iter()
                .map(|l| InvoiceLine {
                    name: l.name.clone(),
                    quantity: l.quantity_sold,
                    unit_price: l.price_at_sale.clone(),
                    line_total: l.line_total.clone(),
                })
                .collect(),
            total_amount: sale.total_amount.clone(),
            issued_at: sale.timestamp,
        }
    }
}
