//! Product stock entity - Quantity on hand of one product at one location.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-location stock row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_stock")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this row belongs to
    pub product_id: i64,
    /// Location name (warehouse, plant, yard)
    pub location: String,
    /// Quantity on hand, rounded to one decimal
    pub quantity: f64,
}

/// Defines relationships between `ProductStock` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each stock row belongs to one product
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
