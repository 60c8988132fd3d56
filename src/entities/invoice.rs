//! Invoice entity - A sale that moves stock out of one location.
//!
//! `items_summary` holds a JSON array of [`ItemSummary`] so the invoice can be
//! listed without joining its lines.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice header
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice number, unique among live invoices
    pub invoice_no: String,
    /// Billed customer
    pub customer_id: String,
    /// Customer display name at the time of invoicing
    pub customer_name: String,
    /// Invoice date
    pub invoice_date: Date,
    /// Location the goods leave from
    pub from_location: String,
    /// Tax rate in percent
    pub tax_rate: f64,
    /// Transporter name
    pub transporter: Option<String>,
    /// Vehicle registration
    pub vehicle_no: Option<String>,
    /// Free-form remarks
    pub remarks: Option<String>,
    /// JSON array of `ItemSummary`
    pub items_summary: String,
    /// User who created the invoice
    pub created_by: String,
    /// When the invoice was created
    pub created_at: DateTimeUtc,
    /// When the invoice was last modified
    pub updated_at: DateTimeUtc,
}

/// Denormalized line snapshot stored on the invoice header
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    /// Product id
    pub product_id: i64,
    /// Product name at invoicing time
    pub product_name: String,
    /// Invoiced quantity
    pub quantity: f64,
    /// Unit price
    pub price: f64,
    /// HSN code at invoicing time
    pub hsn_code: String,
    /// Linked purchase order, if any
    pub purchase_order_id: Option<i64>,
}

impl Model {
    /// Decodes the stored `items_summary` JSON.
    ///
    /// # Errors
    /// Returns an error if the stored text is not a valid summary array.
    pub fn summary(&self) -> crate::errors::Result<Vec<ItemSummary>> {
        serde_json::from_str(&self.items_summary).map_err(Into::into)
    }
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One invoice has many item rows
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
    /// One invoice has many dispatch rows
    #[sea_orm(has_many = "super::dispatch::Entity")]
    Dispatches,
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::dispatch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
