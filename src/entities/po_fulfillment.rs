//! PO fulfillment entity - How much of a PO line one invoice satisfied.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfillment record
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "po_fulfillments")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// PO line that was fulfilled
    pub po_item_id: i64,
    /// Invoice number that delivered the quantity
    pub invoice_no: String,
    /// Delivered quantity
    pub quantity: f64,
    /// Invoice date
    pub date: Date,
}

/// Defines relationships between `PoFulfillment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each fulfillment belongs to one PO line
    #[sea_orm(
        belongs_to = "super::purchase_order_item::Entity",
        from = "Column::PoItemId",
        to = "super::purchase_order_item::Column::Id"
    )]
    Item,
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
