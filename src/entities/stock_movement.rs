//! Stock movement entity - Append-only signed quantity log for every stock change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused a stock movement
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum MovementType {
    /// Goods received from an import supplier
    #[sea_orm(string_value = "IMPORT")]
    Import,
    /// Goods bought locally
    #[sea_orm(string_value = "LOCAL_PURCHASE")]
    LocalPurchase,
    /// Goods invoiced out
    #[sea_orm(string_value = "INVOICE")]
    Invoice,
    /// Lines rewritten by an invoice edit
    #[sea_orm(string_value = "INVOICE_EDIT")]
    InvoiceEdit,
    /// Arrival side of a transfer
    #[sea_orm(string_value = "TRANSFER_IN")]
    TransferIn,
    /// Departure side of a transfer
    #[sea_orm(string_value = "TRANSFER_OUT")]
    TransferOut,
    /// Manual stock entry
    #[sea_orm(string_value = "STOCK_ENTRY")]
    StockEntry,
    /// Reconciliation to a counted level
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Import => "IMPORT",
            Self::LocalPurchase => "LOCAL_PURCHASE",
            Self::Invoice => "INVOICE",
            Self::InvoiceEdit => "INVOICE_EDIT",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
            Self::StockEntry => "STOCK_ENTRY",
            Self::Adjustment => "ADJUSTMENT",
        };
        f.write_str(label)
    }
}

/// Stock movement row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product whose stock changed
    pub product_id: i64,
    /// Location whose stock changed
    pub location: String,
    /// Signed quantity delta
    pub change_qty: f64,
    /// Cause of the movement
    pub movement_type: MovementType,
    /// Invoice that produced this row, if any
    pub invoice_id: Option<i64>,
    /// Free-form reference (invoice number, bill number, transfer id)
    pub reference: Option<String>,
    /// User who performed the change
    pub user_id: String,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `StockMovement` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement concerns one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
