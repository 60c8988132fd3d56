//! Purchase order line entity.
//!
//! `remaining_qty` always equals `total_qty - delivered_qty` after a commit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase order line
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this line belongs to
    pub purchase_order_id: i64,
    /// Ordered product
    pub product_id: i64,
    /// Ordered quantity
    pub total_qty: f64,
    /// Quantity invoiced so far
    pub delivered_qty: f64,
    /// `total_qty - delivered_qty`
    pub remaining_qty: f64,
    /// Agreed unit rate
    pub rate: f64,
}

/// Defines relationships between `PurchaseOrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    /// One line has many fulfillments
    #[sea_orm(has_many = "super::po_fulfillment::Entity")]
    Fulfillments,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::po_fulfillment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fulfillments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
