//! Dispatch entity - Per-line shipment record used for logistics reporting.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dispatch row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatches")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
    /// Invoice number at dispatch time
    pub invoice_no: String,
    /// Customer receiving the goods
    pub customer_id: String,
    /// Dispatched product
    pub product_id: i64,
    /// Product name at dispatch time
    pub product_name: String,
    /// Dispatched quantity
    pub quantity: f64,
    /// Unit price
    pub price: f64,
    /// Tax rate in percent
    pub tax_rate: f64,
    /// `quantity * price * tax_rate / 100`
    pub tax_amount: f64,
    /// `quantity * price + tax_amount`
    pub item_total: f64,
    /// Location the goods left from
    pub from_location: String,
    /// Transporter name
    pub transporter: Option<String>,
    /// Vehicle registration
    pub vehicle_no: Option<String>,
    /// Invoice date
    pub dispatch_date: Date,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Dispatch and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each dispatch belongs to one invoice
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
