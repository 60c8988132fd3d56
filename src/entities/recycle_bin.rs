//! Recycle bin entity - Soft-delete snapshots that can be replayed on restore.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of record held in the bin
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BinEntryType {
    /// An invoice with its items, movements and dispatches
    #[sea_orm(string_value = "INVOICE")]
    Invoice,
}

/// Recycle bin row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recycle_bin")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Id of the deleted record
    pub original_id: i64,
    /// Kind of deleted record
    pub entry_type: BinEntryType,
    /// When the record was deleted
    pub deleted_at: DateTimeUtc,
    /// User who deleted it
    pub deleted_by: String,
    /// JSON snapshot of the record and everything derived from it
    pub data: String,
}

/// `RecycleBin` rows stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
