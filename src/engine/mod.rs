//! Transaction engine: mutation planning, orchestration, metrics
pub mod metrics;
pub mod mutation;
pub mod orchestrator;

pub use metrics::{summarize, total_sales, InventorySummary};
pub use mutation::{plan_restock, plan_sale, StockWrite, WriteSet};
pub use orchestrator::{Orchestrator, RestockReceipt, Role, Session, TxPhase};
