//! Expenses, including the purchase and freight costs implied by stock receipts.
//!
//! Receipts do not write expenses themselves. They return [`ExpenseEvent`]s and
//! the caller records them with [`record_expense_events`] in a separate
//! transaction, so a failed expense write never undoes received stock.

use crate::{
    core::actor::Actor,
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Category for the price paid for received goods
pub const PURCHASE_CATEGORY: &str = "Purchase";
/// Category for freight paid on received goods
pub const FREIGHT_CATEGORY: &str = "Freight";

/// An expense to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEvent {
    /// Expense category
    pub category: String,
    /// Amount paid
    pub amount: f64,
    /// Human-readable description
    pub description: String,
    /// Source document reference
    pub reference: Option<String>,
    /// Date the expense applies to
    pub date: NaiveDate,
}

/// Writes every event as one expense row, all or nothing.
///
/// # Errors
/// Returns an error if an amount is negative or not finite, or the insert fails.
pub async fn record_expense_events(
    db: &DatabaseConnection,
    actor: &Actor,
    events: &[ExpenseEvent],
) -> Result<Vec<expense::Model>> {
    if let Some(bad) = events
        .iter()
        .find(|e| e.amount < 0.0 || !e.amount.is_finite())
    {
        return Err(Error::InvalidAmount { amount: bad.amount });
    }
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();
    let mut written = Vec::with_capacity(events.len());

    for event in events {
        let row = expense::ActiveModel {
            category: Set(event.category.clone()),
            amount: Set(event.amount),
            description: Set(event.description.clone()),
            reference: Set(event.reference.clone()),
            expense_date: Set(event.date),
            user_id: Set(actor.user_id.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        written.push(row);
    }

    txn.commit().await?;
    tracing::info!(count = written.len(), "Expenses recorded");
    Ok(written)
}

/// Lists expenses, newest first.
pub async fn list_expenses(db: &DatabaseConnection) -> Result<Vec<expense::Model>> {
    Expense::find()
        .order_by_desc(expense::Column::ExpenseDate)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn event(category: &str, amount: f64) -> ExpenseEvent {
        ExpenseEvent {
            category: category.to_string(),
            amount,
            description: "Test".to_string(),
            reference: None,
            date: test_date(),
        }
    }

    #[tokio::test]
    async fn test_record_rejects_bad_amounts() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = record_expense_events(&db, &staff(), &[event(FREIGHT_CATEGORY, -5.0)]).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == -5.0));
    }

    #[tokio::test]
    async fn test_record_and_list() -> Result<()> {
        let db = setup_test_db().await?;

        let written = record_expense_events(
            &db,
            &staff(),
            &[event(PURCHASE_CATEGORY, 1200.0), event(FREIGHT_CATEGORY, 80.0)],
        )
        .await?;
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].user_id, "clerk");

        let listed = list_expenses(&db).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].category, FREIGHT_CATEGORY);

        assert!(record_expense_events(&db, &staff(), &[]).await?.is_empty());
        Ok(())
    }
}
