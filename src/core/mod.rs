//! Core business logic - framework-agnostic inventory ledger operations.
//!
//! Every mutating operation runs as exactly one database transaction: gather
//! the ids it touches, read them, validate, compute the new state, then write.

pub mod actor;
pub mod expense;
pub mod invoice;
pub mod journal;
pub mod ledger;
pub mod product;
pub mod purchase_order;
pub mod quantity;
pub mod recycle_bin;
pub mod report;
pub mod settings;
pub mod stock;
