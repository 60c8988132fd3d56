//! Invoice ledger transactions.
//!
//! Creating, editing and deleting an invoice each run as one database
//! transaction that moves product stock, purchase order delivery, and the derived
//! item, movement and dispatch rows together. Each follows the same order: read
//! every product and purchase order involved, validate and plan against the
//! in-memory [`StockBook`](crate::core::ledger::StockBook) and
//! [`OrderBook`](crate::core::purchase_order::OrderBook), then write. A failed
//! check returns before the first write, and the dropped transaction rolls back.
//!
//! Only the invoice number pre-check and its inputs are read before the
//! transaction opens. Edits re-read the stored header and lines inside it, and
//! the `invoice_numbers` row written there closes the race the pre-check leaves
//! open.

use crate::{
    core::{
        actor::Actor,
        journal,
        ledger::{InvoiceDiff, ResolvedLine, StockBook},
        product, purchase_order,
        quantity::parse_quantity,
        recycle_bin::InvoiceSnapshot,
        settings,
    },
    entities::{
        Invoice, InvoiceNumber, invoice,
        invoice::ItemSummary,
        invoice_number, recycle_bin,
        recycle_bin::BinEntryType,
        stock_movement::MovementType,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Invoice header fields supplied by the caller.
#[derive(Debug, Clone)]
pub struct InvoiceHeader {
    /// Invoice number, unique among live invoices
    pub invoice_no: String,
    /// Billed customer
    pub customer_id: String,
    /// Customer display name
    pub customer_name: String,
    /// Invoice date; also the date stamped on PO fulfillments
    pub invoice_date: NaiveDate,
    /// Tax rate in percent
    pub tax_rate: f64,
    /// Transporter name
    pub transporter: Option<String>,
    /// Vehicle registration
    pub vehicle_no: Option<String>,
    /// Free-form remarks
    pub remarks: Option<String>,
}

/// One invoice line as entered.
#[derive(Debug, Clone)]
pub struct InvoiceLine {
    /// Invoiced product
    pub product_id: i64,
    /// Quantity as typed; non-numeric characters are ignored
    pub quantity: String,
    /// Unit price; the product's price when `None`
    pub price: Option<f64>,
    /// Purchase order this line fulfils
    pub purchase_order_id: Option<i64>,
}

fn validate_request(
    header: &InvoiceHeader,
    lines: &[InvoiceLine],
    from_location: &str,
) -> Result<()> {
    if from_location.trim().is_empty() {
        return Err(Error::validation("Dispatch location is required"));
    }
    if header.invoice_no.trim().is_empty() {
        return Err(Error::validation("Invoice number is required"));
    }
    if lines.is_empty() {
        return Err(Error::validation("An invoice needs at least one item"));
    }
    if !header.tax_rate.is_finite() || header.tax_rate < 0.0 {
        return Err(Error::InvalidAmount {
            amount: header.tax_rate,
        });
    }
    Ok(())
}

/// Resolves each entered line against the products read in the transaction.
fn resolve_lines(book: &StockBook, lines: &[InvoiceLine]) -> Result<Vec<ResolvedLine>> {
    lines
        .iter()
        .map(|line| {
            let product = &book.get(line.product_id)?.product;
            let quantity =
                parse_quantity(&line.quantity).ok_or_else(|| Error::InvalidQuantity {
                    product: product.name.clone(),
                    raw: line.quantity.clone(),
                })?;
            let price = line.price.unwrap_or(product.price);
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidAmount { amount: price });
            }
            Ok(ResolvedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                hsn_code: product.hsn_code.clone(),
                quantity,
                price,
                purchase_order_id: line.purchase_order_id,
            })
        })
        .collect()
}

fn items_summary(lines: &[ResolvedLine]) -> Result<String> {
    let summary: Vec<ItemSummary> = lines
        .iter()
        .map(|l| ItemSummary {
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            quantity: l.quantity,
            price: l.price,
            hsn_code: l.hsn_code.clone(),
            purchase_order_id: l.purchase_order_id,
        })
        .collect();
    serde_json::to_string(&summary).map_err(Into::into)
}

/// Fails with `Conflict` if another live invoice already uses `invoice_no`.
///
/// This is a planning read outside the write transaction.
pub async fn ensure_invoice_no_available<C>(
    db: &C,
    invoice_no: &str,
    except_invoice_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = get_invoice_by_number(db, invoice_no).await?;
    match existing {
        Some(found) if Some(found.id) != except_invoice_id => Err(Error::conflict(format!(
            "Invoice number {invoice_no} already exists"
        ))),
        _ => Ok(()),
    }
}

/// Writes the `invoice_numbers` row for an invoice.
pub(crate) async fn reserve_invoice_no<C>(db: &C, invoice: &invoice::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = invoice_number::ActiveModel {
        invoice_no: Set(invoice.invoice_no.clone()),
        invoice_id: Set(invoice.id),
        ..Default::default()
    };
    InvoiceNumber::insert(row)
        .exec_without_returning(db)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict { .. } => Error::conflict(format!(
                "Invoice number {} already exists",
                invoice.invoice_no
            )),
            other => other,
        })?;
    Ok(())
}

/// Drops the `invoice_numbers` row for `invoice_no`.
async fn release_invoice_no<C>(db: &C, invoice_no: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    InvoiceNumber::delete_many()
        .filter(invoice_number::Column::InvoiceNo.eq(invoice_no))
        .exec(db)
        .await?;
    Ok(())
}

/// Whether `invoice_no` holds an `invoice_numbers` row.
pub async fn is_invoice_no_reserved<C>(db: &C, invoice_no: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(InvoiceNumber::find()
        .filter(invoice_number::Column::InvoiceNo.eq(invoice_no))
        .one(db)
        .await?
        .is_some())
}

/// Creates an invoice, debiting stock at `from_location` and delivering against
/// any referenced purchase orders, in one transaction.
///
/// # Errors
/// - `Validation` for a missing location or number, an empty line list, an
///   unparsable quantity, insufficient stock or a PO over-delivery
/// - `NotFound` for a missing product, purchase order or PO line
/// - `Conflict` when the invoice number is already used
#[instrument(skip(db, actor, header, lines), fields(invoice_no = %header.invoice_no))]
pub async fn create_invoice(
    db: &DatabaseConnection,
    actor: &Actor,
    header: InvoiceHeader,
    lines: &[InvoiceLine],
    from_location: &str,
) -> Result<invoice::Model> {
    validate_request(&header, lines, from_location)?;
    let invoice_no = header.invoice_no.trim().to_string();
    let from_location = from_location.trim();

    ensure_invoice_no_available(db, &invoice_no, None).await?;
    let policy = settings::stock_policy(db).await?;

    let txn = db.begin().await?;

    let mut stock = product::load_stock_book(&txn, lines.iter().map(|l| l.product_id)).await?;
    let mut orders =
        purchase_order::load_order_book(&txn, lines.iter().filter_map(|l| l.purchase_order_id))
            .await?;

    let resolved = resolve_lines(&stock, lines)?;
    for line in &resolved {
        if let Some(order_id) = line.purchase_order_id {
            orders.deliver(
                order_id,
                line.product_id,
                &line.product_name,
                line.quantity,
                &invoice_no,
                header.invoice_date,
            )?;
        }
        stock.debit(line.product_id, from_location, line.quantity, policy)?;
    }

    let now = chrono::Utc::now();
    let invoice = invoice::ActiveModel {
        invoice_no: Set(invoice_no),
        customer_id: Set(header.customer_id),
        customer_name: Set(header.customer_name),
        invoice_date: Set(header.invoice_date),
        from_location: Set(from_location.to_string()),
        tax_rate: Set(header.tax_rate),
        transporter: Set(header.transporter),
        vehicle_no: Set(header.vehicle_no),
        remarks: Set(header.remarks),
        items_summary: Set(items_summary(&resolved)?),
        created_by: Set(actor.user_id.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    reserve_invoice_no(&txn, &invoice).await?;
    journal::write_invoice_lines(
        &txn,
        &invoice,
        &resolved,
        MovementType::Invoice,
        &actor.user_id,
    )
    .await?;
    product::write_stock_book(&txn, &stock).await?;
    purchase_order::write_order_book(&txn, &orders).await?;

    txn.commit().await?;
    info!(
        invoice_id = invoice.id,
        lines = resolved.len(),
        from_location = %invoice.from_location,
        "Invoice created"
    );
    Ok(invoice)
}

/// Rewrites an invoice: stored lines are reversed and the new lines applied as
/// one transaction.
///
/// Stock moves by the net `(product, location)` delta, so changing the dispatch
/// location credits the old location and debits the new one. Purchase order
/// lines referenced by the old lines give back their quantity and drop this
/// invoice's fulfillments before the new lines deliver again. All item,
/// movement and dispatch rows are replaced; the new movements are typed
/// `INVOICE_EDIT`.
///
/// # Errors
/// As [`create_invoice`], plus `NotFound` when the invoice does not exist.
#[instrument(skip(db, actor, header, lines), fields(invoice_no = %header.invoice_no))]
pub async fn update_invoice(
    db: &DatabaseConnection,
    actor: &Actor,
    invoice_id: i64,
    header: InvoiceHeader,
    lines: &[InvoiceLine],
    from_location: &str,
) -> Result<invoice::Model> {
    validate_request(&header, lines, from_location)?;
    let invoice_no = header.invoice_no.trim().to_string();
    let from_location = from_location.trim();

    // Planning reads
    let existing = get_invoice(db, invoice_id)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;
    let renumbered = existing.invoice_no != invoice_no;
    if renumbered {
        ensure_invoice_no_available(db, &invoice_no, Some(invoice_id)).await?;
    }
    let policy = settings::stock_policy(db).await?;

    let txn = db.begin().await?;

    let current = Invoice::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;
    let old_items = journal::items_for_invoice(&txn, invoice_id).await?;

    let product_ids = old_items
        .iter()
        .map(|i| i.product_id)
        .chain(lines.iter().map(|l| l.product_id));
    let order_ids = old_items
        .iter()
        .filter_map(|i| i.purchase_order_id)
        .chain(lines.iter().filter_map(|l| l.purchase_order_id));
    let mut stock = product::load_stock_book(&txn, product_ids).await?;
    let mut orders = purchase_order::load_order_book(&txn, order_ids).await?;

    let resolved = resolve_lines(&stock, lines)?;
    let diff = InvoiceDiff::compute(&current.from_location, &old_items, from_location, &resolved);
    debug!(changes = ?diff.changes, neutral = diff.is_stock_neutral(), "Invoice edit planned");

    stock.apply_deltas(&diff.stock_deltas, policy)?;
    for item in &old_items {
        if let Some(order_id) = item.purchase_order_id {
            orders.reverse(order_id, item.product_id, item.quantity, &current.invoice_no);
        }
    }
    for line in &resolved {
        if let Some(order_id) = line.purchase_order_id {
            orders.deliver(
                order_id,
                line.product_id,
                &line.product_name,
                line.quantity,
                &invoice_no,
                header.invoice_date,
            )?;
        }
    }

    journal::delete_invoice_lines(&txn, invoice_id).await?;

    let old_invoice_no = current.invoice_no.clone();
    let mut active: invoice::ActiveModel = current.into();
    active.invoice_no = Set(invoice_no);
    active.customer_id = Set(header.customer_id);
    active.customer_name = Set(header.customer_name);
    active.invoice_date = Set(header.invoice_date);
    active.from_location = Set(from_location.to_string());
    active.tax_rate = Set(header.tax_rate);
    active.transporter = Set(header.transporter);
    active.vehicle_no = Set(header.vehicle_no);
    active.remarks = Set(header.remarks);
    active.items_summary = Set(items_summary(&resolved)?);
    active.updated_at = Set(chrono::Utc::now());
    let invoice = active.update(&txn).await?;

    if renumbered {
        release_invoice_no(&txn, &old_invoice_no).await?;
        reserve_invoice_no(&txn, &invoice).await?;
    }

    journal::write_invoice_lines(
        &txn,
        &invoice,
        &resolved,
        MovementType::InvoiceEdit,
        &actor.user_id,
    )
    .await?;
    product::write_stock_book(&txn, &stock).await?;
    purchase_order::write_order_book(&txn, &orders).await?;

    txn.commit().await?;
    info!(invoice_id, lines = resolved.len(), "Invoice updated");
    Ok(invoice)
}

/// Deletes an invoice into the recycle bin.
///
/// In one transaction: stock is credited back at the invoice's location,
/// purchase order deliveries and fulfillments are reversed, a snapshot of the
/// invoice with its items, movements and dispatches is written to the bin, and
/// the invoice and its rows are removed.
///
/// # Errors
/// `NotFound` when the invoice or one of its products does not exist.
#[instrument(skip(db, actor))]
pub async fn delete_invoice(
    db: &DatabaseConnection,
    actor: &Actor,
    invoice_id: i64,
) -> Result<recycle_bin::Model> {
    let txn = db.begin().await?;

    let invoice = Invoice::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;
    let items = journal::items_for_invoice(&txn, invoice_id).await?;
    let movements = journal::movements_for_invoice(&txn, invoice_id).await?;
    let dispatches = journal::dispatches_for_invoice(&txn, invoice_id).await?;

    let mut stock = product::load_stock_book(&txn, items.iter().map(|i| i.product_id)).await?;
    let mut orders =
        purchase_order::load_order_book(&txn, items.iter().filter_map(|i| i.purchase_order_id))
            .await?;

    for item in &items {
        stock.credit(item.product_id, &invoice.from_location, item.quantity)?;
        if let Some(order_id) = item.purchase_order_id {
            orders.reverse(order_id, item.product_id, item.quantity, &invoice.invoice_no);
        }
    }

    let invoice_no = invoice.invoice_no.clone();
    let snapshot = InvoiceSnapshot {
        invoice,
        items,
        movements,
        dispatches,
    };

    let entry = recycle_bin::ActiveModel {
        original_id: Set(invoice_id),
        entry_type: Set(BinEntryType::Invoice),
        deleted_at: Set(chrono::Utc::now()),
        deleted_by: Set(actor.user_id.clone()),
        data: Set(serde_json::to_string(&snapshot)?),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    journal::delete_invoice_lines(&txn, invoice_id).await?;
    release_invoice_no(&txn, &invoice_no).await?;
    Invoice::delete_by_id(invoice_id).exec(&txn).await?;
    product::write_stock_book(&txn, &stock).await?;
    purchase_order::write_order_book(&txn, &orders).await?;

    txn.commit().await?;
    info!(invoice_id, %invoice_no, bin_entry = entry.id, "Invoice moved to recycle bin");
    Ok(entry)
}

/// Retrieves an invoice by id.
pub async fn get_invoice<C>(db: &C, invoice_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a live invoice by number.
pub async fn get_invoice_by_number<C>(db: &C, invoice_no: &str) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::InvoiceNo.eq(invoice_no.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live invoices, newest first.
pub async fn list_invoices(db: &DatabaseConnection) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .order_by_desc(invoice::Column::InvoiceDate)
        .order_by_desc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
