//! Auxiliary ledger writers: invoice item rows, stock movements and dispatches.
//!
//! These rows are derived from ledger transactions and only ever written inside
//! one. They are append-only except for the wholesale replacement an invoice edit
//! or delete performs.

use crate::{
    core::ledger::{ResolvedLine, dispatch_amounts},
    entities::{
        Dispatch, InvoiceItem, StockMovement, dispatch, invoice, invoice_item, stock_movement,
        stock_movement::MovementType,
    },
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// A stock movement to record.
#[derive(Debug, Clone)]
pub struct MovementEntry<'a> {
    /// Product whose stock changed
    pub product_id: i64,
    /// Location whose stock changed
    pub location: &'a str,
    /// Signed quantity delta
    pub change_qty: f64,
    /// Cause
    pub movement_type: MovementType,
    /// Owning invoice, if any
    pub invoice_id: Option<i64>,
    /// Free-form reference
    pub reference: Option<String>,
    /// Acting user
    pub user_id: &'a str,
}

/// Records one stock movement.
pub async fn record_movement<C>(db: &C, entry: MovementEntry<'_>) -> Result<stock_movement::Model>
where
    C: ConnectionTrait,
{
    stock_movement::ActiveModel {
        product_id: Set(entry.product_id),
        location: Set(entry.location.to_string()),
        change_qty: Set(entry.change_qty),
        movement_type: Set(entry.movement_type),
        invoice_id: Set(entry.invoice_id),
        reference: Set(entry.reference),
        user_id: Set(entry.user_id.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Writes the item, movement and dispatch rows for every line of `invoice`.
///
/// Each line debits the invoice's `from_location`, so its movement carries
/// `-quantity`.
pub async fn write_invoice_lines<C>(
    db: &C,
    invoice: &invoice::Model,
    lines: &[ResolvedLine],
    movement_type: MovementType,
    user_id: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();

    for line in lines {
        invoice_item::ActiveModel {
            invoice_id: Set(invoice.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            hsn_code: Set(line.hsn_code.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            purchase_order_id: Set(line.purchase_order_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        record_movement(
            db,
            MovementEntry {
                product_id: line.product_id,
                location: &invoice.from_location,
                change_qty: -line.quantity,
                movement_type,
                invoice_id: Some(invoice.id),
                reference: Some(invoice.invoice_no.clone()),
                user_id,
            },
        )
        .await?;

        let amounts = dispatch_amounts(line.quantity, line.price, invoice.tax_rate);
        dispatch::ActiveModel {
            invoice_id: Set(invoice.id),
            invoice_no: Set(invoice.invoice_no.clone()),
            customer_id: Set(invoice.customer_id.clone()),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            tax_rate: Set(invoice.tax_rate),
            tax_amount: Set(amounts.tax_amount),
            item_total: Set(amounts.item_total),
            from_location: Set(invoice.from_location.clone()),
            transporter: Set(invoice.transporter.clone()),
            vehicle_no: Set(invoice.vehicle_no.clone()),
            dispatch_date: Set(invoice.invoice_date),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Deletes every item, movement and dispatch row tied to an invoice.
pub async fn delete_invoice_lines<C>(db: &C, invoice_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    InvoiceItem::delete_many()
        .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
        .exec(db)
        .await?;
    StockMovement::delete_many()
        .filter(stock_movement::Column::InvoiceId.eq(invoice_id))
        .exec(db)
        .await?;
    Dispatch::delete_many()
        .filter(dispatch::Column::InvoiceId.eq(invoice_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Item rows of an invoice, in line order.
pub async fn items_for_invoice<C>(db: &C, invoice_id: i64) -> Result<Vec<invoice_item::Model>>
where
    C: ConnectionTrait,
{
    InvoiceItem::find()
        .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(invoice_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Movement rows of an invoice, in write order.
pub async fn movements_for_invoice<C>(
    db: &C,
    invoice_id: i64,
) -> Result<Vec<stock_movement::Model>>
where
    C: ConnectionTrait,
{
    StockMovement::find()
        .filter(stock_movement::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(stock_movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Dispatch rows of an invoice, in line order.
pub async fn dispatches_for_invoice<C>(db: &C, invoice_id: i64) -> Result<Vec<dispatch::Model>>
where
    C: ConnectionTrait,
{
    Dispatch::find()
        .filter(dispatch::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(dispatch::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Movement history of a product, newest first.
pub async fn movements_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<stock_movement::Model>> {
    StockMovement::find()
        .filter(stock_movement::Column::ProductId.eq(product_id))
        .order_by_desc(stock_movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Re-inserts rows captured in a snapshot under their original ids.
pub async fn reinsert_snapshot_rows<C>(
    db: &C,
    items: &[invoice_item::Model],
    movements: &[stock_movement::Model],
    dispatches: &[dispatch::Model],
) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        let active: invoice_item::ActiveModel = item.clone().into();
        InvoiceItem::insert(active.reset_all())
            .exec_without_returning(db)
            .await?;
    }
    for movement in movements {
        let active: stock_movement::ActiveModel = movement.clone().into();
        StockMovement::insert(active.reset_all())
            .exec_without_returning(db)
            .await?;
    }
    for row in dispatches {
        let active: dispatch::ActiveModel = row.clone().into();
        Dispatch::insert(active.reset_all())
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_record_movement_and_history() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "Cement", &[]).await?;

        for qty in [5.0, -2.0] {
            record_movement(
                &db,
                MovementEntry {
                    product_id: product.id,
                    location: "WH1",
                    change_qty: qty,
                    movement_type: MovementType::StockEntry,
                    invoice_id: None,
                    reference: None,
                    user_id: "clerk",
                },
            )
            .await?;
        }

        let history = movements_for_product(&db, product.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].change_qty, -2.0);
        assert_eq!(history[1].movement_type, MovementType::StockEntry);
        assert_eq!(history[1].user_id, "clerk");

        Ok(())
    }
}
