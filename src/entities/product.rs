//! Product entity - A stocked item held at one or more locations.
//!
//! `stock_qty` is a cached total of the product's `product_stock` rows. It is only
//! ever written by `core::product::write_stock`, which recomputes it from the
//! per-location quantities in the same transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "OPC Cement 53 Grade")
    pub name: String,
    /// Stock keeping unit code
    pub sku: String,
    /// HSN tax classification code
    pub hsn_code: String,
    /// Default unit price
    pub price: f64,
    /// Sum of all location quantities, rounded to one decimal
    pub stock_qty: f64,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product or its stock was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has one stock row per location
    #[sea_orm(has_many = "super::product_stock::Entity")]
    Stock,
    /// One product has many movements
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    Movements,
}

impl Related<super::product_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
