//! Purchase order entity - A customer's commitment to buy, fulfilled by invoices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment status, derived from the order's lines after every change
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PurchaseOrderStatus {
    /// Nothing delivered yet
    #[sea_orm(string_value = "Open")]
    Open,
    /// Some quantity delivered, not every line complete
    #[sea_orm(string_value = "Partially Fulfilled")]
    PartiallyFulfilled,
    /// Every line has no remaining quantity
    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::PartiallyFulfilled => write!(f, "Partially Fulfilled"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Purchase order header
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer-facing PO number
    pub po_number: String,
    /// Customer that placed the order
    pub customer_id: String,
    /// Order date
    pub date: Date,
    /// Derived fulfillment status
    pub status: PurchaseOrderStatus,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `PurchaseOrder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many lines
    #[sea_orm(has_many = "super::purchase_order_item::Entity")]
    Items,
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
