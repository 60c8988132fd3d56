//! Settings entity - Key/value rows for ledger-wide switches such as
//! `allow_negative_stock`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Setting key
    #[sea_orm(unique)]
    pub key: String,
    /// Setting value stored as text
    pub value: String,
    /// When the setting was last written
    pub updated_at: DateTimeUtc,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
