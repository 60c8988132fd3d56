//! Expense entity - Money paid out, including costs implied by stock receipts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense category (e.g., `"Purchase"`, `"Freight"`)
    pub category: String,
    /// Amount paid
    pub amount: f64,
    /// Human-readable description
    pub description: String,
    /// Source document reference (e.g., `"stock_receipt:12"`)
    pub reference: Option<String>,
    /// Date the expense applies to
    pub expense_date: Date,
    /// User who recorded it
    pub user_id: String,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Expenses have no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
