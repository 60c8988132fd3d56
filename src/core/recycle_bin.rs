//! Recycle bin: restore or purge deleted invoices.
//!
//! Deleting an invoice (see [`delete_invoice`](crate::core::invoice::delete_invoice))
//! leaves an [`InvoiceSnapshot`] here. Restoring replays it: stock is debited
//! and purchase orders re-delivered under the same checks as a fresh invoice,
//! then every captured row goes back under its original id. Both restore and
//! permanent deletion are admin-only.

use crate::{
    core::{
        actor::Actor,
        invoice::{ensure_invoice_no_available, get_invoice, reserve_invoice_no},
        journal, product, purchase_order, settings,
    },
    entities::{
        Invoice, RecycleBin, dispatch, invoice, invoice_item, recycle_bin,
        recycle_bin::BinEntryType, stock_movement,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Everything needed to put a deleted invoice back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    /// Invoice header row
    pub invoice: invoice::Model,
    /// Item rows
    pub items: Vec<invoice_item::Model>,
    /// Movement rows
    pub movements: Vec<stock_movement::Model>,
    /// Dispatch rows
    pub dispatches: Vec<dispatch::Model>,
}

impl InvoiceSnapshot {
    /// Parses the snapshot held by a bin entry.
    pub fn from_entry(entry: &recycle_bin::Model) -> Result<Self> {
        match entry.entry_type {
            BinEntryType::Invoice => serde_json::from_str(&entry.data).map_err(Into::into),
        }
    }
}

/// Retrieves a bin entry by id.
pub async fn get_entry<C>(db: &C, entry_id: i64) -> Result<Option<recycle_bin::Model>>
where
    C: ConnectionTrait,
{
    RecycleBin::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists bin entries, most recently deleted first.
pub async fn list_entries(db: &DatabaseConnection) -> Result<Vec<recycle_bin::Model>> {
    RecycleBin::find()
        .order_by_desc(recycle_bin::Column::DeletedAt)
        .order_by_desc(recycle_bin::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Restores a deleted invoice from the bin.
///
/// Stock at the invoice's location is debited and each PO line re-delivered,
/// stamped with the invoice's own date. The invoice, items, movements and
/// dispatches are re-inserted under their original ids and the entry is removed.
///
/// # Errors
/// - `Unauthorized` unless the actor is an admin
/// - `NotFound` if the entry, a product or a PO line no longer exists
/// - `Conflict` if the invoice number or id was taken since deletion
/// - `Validation` if stock or PO balance no longer covers the invoice
#[instrument(skip(db, actor), fields(user_id = %actor.user_id))]
pub async fn restore_invoice(
    db: &DatabaseConnection,
    actor: &Actor,
    entry_id: i64,
) -> Result<invoice::Model> {
    actor.require_admin("restore invoices")?;

    let entry = get_entry(db, entry_id)
        .await?
        .ok_or_else(|| Error::not_found("Recycle bin entry", entry_id))?;
    let snapshot = InvoiceSnapshot::from_entry(&entry)?;
    let invoice = snapshot.invoice;

    ensure_invoice_no_available(db, &invoice.invoice_no, None).await?;
    if get_invoice(db, invoice.id).await?.is_some() {
        return Err(Error::conflict(format!(
            "Invoice id {} is already in use",
            invoice.id
        )));
    }
    let policy = settings::stock_policy(db).await?;

    let txn = db.begin().await?;

    let mut stock =
        product::load_stock_book(&txn, snapshot.items.iter().map(|i| i.product_id)).await?;
    let mut orders = purchase_order::load_order_book(
        &txn,
        snapshot.items.iter().filter_map(|i| i.purchase_order_id),
    )
    .await?;

    for item in &snapshot.items {
        if let Some(order_id) = item.purchase_order_id {
            orders.deliver(
                order_id,
                item.product_id,
                &item.product_name,
                item.quantity,
                &invoice.invoice_no,
                invoice.invoice_date,
            )?;
        }
        stock.debit(item.product_id, &invoice.from_location, item.quantity, policy)?;
    }

    let active: invoice::ActiveModel = invoice.clone().into();
    Invoice::insert(active.reset_all())
        .exec_without_returning(&txn)
        .await?;
    reserve_invoice_no(&txn, &invoice).await?;
    journal::reinsert_snapshot_rows(
        &txn,
        &snapshot.items,
        &snapshot.movements,
        &snapshot.dispatches,
    )
    .await?;
    product::write_stock_book(&txn, &stock).await?;
    purchase_order::write_order_book(&txn, &orders).await?;
    RecycleBin::delete_by_id(entry_id).exec(&txn).await?;

    txn.commit().await?;
    info!(invoice_id = invoice.id, invoice_no = %invoice.invoice_no, "Invoice restored");
    Ok(invoice)
}

/// Removes a bin entry for good. Ledger state is untouched.
///
/// # Errors
/// - `Unauthorized` unless the actor is an admin
/// - `NotFound` if the entry does not exist
#[instrument(skip(db, actor), fields(user_id = %actor.user_id))]
pub async fn permanently_delete(
    db: &DatabaseConnection,
    actor: &Actor,
    entry_id: i64,
) -> Result<()> {
    actor.require_admin("permanently delete recycle bin entries")?;

    let result = RecycleBin::delete_by_id(entry_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Recycle bin entry", entry_id));
    }
    info!(entry_id, "Recycle bin entry purged");
    Ok(())
}
