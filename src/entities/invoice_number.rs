//! Invoice number index - One row per live invoice number.
//!
//! The row is written in the same transaction as its invoice, so a duplicate
//! number fails the commit on the unique key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice number reservation
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_numbers")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The invoice number
    #[sea_orm(unique)]
    pub invoice_no: String,
    /// Invoice holding the number
    pub invoice_id: i64,
}

/// `InvoiceNumber` is looked up by key only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
