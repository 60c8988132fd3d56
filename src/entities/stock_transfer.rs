//! Stock transfer entity - A move of one product between two locations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transfer record
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transfers")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Moved product
    pub product_id: i64,
    /// Source location
    pub from_location: String,
    /// Destination location
    pub to_location: String,
    /// Moved quantity
    pub quantity: f64,
    /// Optional note
    pub remarks: Option<String>,
    /// User who performed the transfer
    pub user_id: String,
    /// When the transfer was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `StockTransfer` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transfer concerns one product
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
