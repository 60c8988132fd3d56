//! Stock receipt entity - Supplier-linked goods received into a location.
//!
//! Imports and local purchases share one table, told apart by `source`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where received goods came from
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReceiptSource {
    /// Imported goods
    #[sea_orm(string_value = "IMPORT")]
    Import,
    /// Goods bought from a local supplier
    #[sea_orm(string_value = "LOCAL_PURCHASE")]
    LocalPurchase,
}

/// Receipt record
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_receipts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Import or local purchase
    pub source: ReceiptSource,
    /// Supplier the goods came from
    pub supplier_id: String,
    /// Received product
    pub product_id: i64,
    /// Receiving location
    pub location: String,
    /// Received quantity
    pub quantity: f64,
    /// Supplier bill or bill-of-entry number
    pub bill_no: Option<String>,
    /// Amount paid for the goods
    pub purchase_amount: Option<f64>,
    /// Amount paid for freight
    pub freight_amount: Option<f64>,
    /// Receipt date
    pub receipt_date: Date,
    /// User who recorded the receipt
    pub user_id: String,
    /// When the receipt was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `StockReceipt` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each receipt concerns one product
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
