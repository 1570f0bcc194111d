//! Domain model: items, carts, sales, activity log

pub mod aggregates;
pub mod events;
pub mod value_objects;
