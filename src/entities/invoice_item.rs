//! Invoice item entity - One audit row per invoice line.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
    /// Invoiced product
    pub product_id: i64,
    /// Product name at invoicing time
    pub product_name: String,
    /// HSN code at invoicing time
    pub hsn_code: String,
    /// Invoiced quantity
    pub quantity: f64,
    /// Unit price
    pub price: f64,
    /// Linked purchase order, if any
    pub purchase_order_id: Option<i64>,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `InvoiceItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
