//! Stock entry, reconcile, transfer and supplier receipts.
//!
//! Each operation touches one product at one or two locations and runs as a
//! single transaction in the same read, validate, write order as invoices.
//! None of them honour `allow_negative_stock`: a transfer never overdraws its
//! source and a reconcile never sets a negative level.

use crate::{
    core::{
        actor::Actor,
        expense::{ExpenseEvent, FREIGHT_CATEGORY, PURCHASE_CATEGORY},
        journal::{self, MovementEntry},
        ledger::StockPolicy,
        product,
        quantity::{is_positive_quantity, round1},
    },
    entities::{
        stock_movement::{self, MovementType},
        stock_receipt::{self, ReceiptSource},
        stock_transfer,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

fn require_location(location: &str) -> Result<&str> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::validation("Location is required"));
    }
    Ok(location)
}

fn require_positive(quantity: f64) -> Result<f64> {
    if is_positive_quantity(quantity) {
        Ok(round1(quantity))
    } else {
        Err(Error::validation(format!(
            "Quantity must be greater than zero, got {quantity}"
        )))
    }
}

/// Adds `quantity` of a product at `location`.
///
/// # Errors
/// `Validation` for a blank location or a non-positive quantity, `NotFound` for
/// a missing product.
#[instrument(skip(db, actor, remarks))]
pub async fn add_stock(
    db: &DatabaseConnection,
    actor: &Actor,
    product_id: i64,
    location: &str,
    quantity: f64,
    remarks: Option<String>,
) -> Result<stock_movement::Model> {
    let location = require_location(location)?;
    let quantity = require_positive(quantity)?;

    let txn = db.begin().await?;
    let mut book = product::load_stock_book(&txn, [product_id]).await?;
    let level = book.credit(product_id, location, quantity)?;

    product::write_stock_book(&txn, &book).await?;
    let movement = journal::record_movement(
        &txn,
        MovementEntry {
            product_id,
            location,
            change_qty: quantity,
            movement_type: MovementType::StockEntry,
            invoice_id: None,
            reference: remarks,
            user_id: &actor.user_id,
        },
    )
    .await?;

    txn.commit().await?;
    info!(product_id, location, quantity, level, "Stock added");
    Ok(movement)
}

/// Sets a location to an absolute quantity, logging the implied delta.
///
/// # Errors
/// `Validation` for a blank location or a negative or non-finite target,
/// `NotFound` for a missing product.
#[instrument(skip(db, actor, remarks))]
pub async fn update_stock_level(
    db: &DatabaseConnection,
    actor: &Actor,
    product_id: i64,
    location: &str,
    new_quantity: f64,
    remarks: Option<String>,
) -> Result<stock_movement::Model> {
    let location = require_location(location)?;
    if !new_quantity.is_finite() || new_quantity < 0.0 {
        return Err(Error::validation(format!(
            "Stock level cannot be negative, got {new_quantity}"
        )));
    }
    let new_quantity = round1(new_quantity);

    let txn = db.begin().await?;
    let mut book = product::load_stock_book(&txn, [product_id]).await?;
    let previous = book.get(product_id)?.quantity_at(location);
    book.set_level(product_id, location, new_quantity)?;
    let delta = round1(new_quantity - previous);

    product::write_stock_book(&txn, &book).await?;
    let movement = journal::record_movement(
        &txn,
        MovementEntry {
            product_id,
            location,
            change_qty: delta,
            movement_type: MovementType::Adjustment,
            invoice_id: None,
            reference: remarks,
            user_id: &actor.user_id,
        },
    )
    .await?;

    txn.commit().await?;
    info!(product_id, location, previous, new_quantity, "Stock level reconciled");
    Ok(movement)
}

/// A request to move stock between two locations.
#[derive(Debug, Clone)]
pub struct TransferRequest {
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
}

/// Moves stock between two locations of the same product.
///
/// Writes the transfer record and a `TRANSFER_OUT`/`TRANSFER_IN` movement pair.
///
/// # Errors
/// `Validation` for blank or identical locations, a non-positive quantity, or
/// insufficient stock at the source; `NotFound` for a missing product.
#[instrument(skip(db, actor, request), fields(product_id = request.product_id))]
pub async fn transfer_stock(
    db: &DatabaseConnection,
    actor: &Actor,
    request: TransferRequest,
) -> Result<stock_transfer::Model> {
    let from = require_location(&request.from_location)?;
    let to = require_location(&request.to_location)?;
    if from == to {
        return Err(Error::validation(
            "Source and destination locations must differ",
        ));
    }
    let quantity = require_positive(request.quantity)?;
    let product_id = request.product_id;

    let txn = db.begin().await?;
    let mut book = product::load_stock_book(&txn, [product_id]).await?;
    book.debit(product_id, from, quantity, StockPolicy::Strict)?;
    book.credit(product_id, to, quantity)?;

    product::write_stock_book(&txn, &book).await?;
    let transfer = stock_transfer::ActiveModel {
        product_id: Set(product_id),
        from_location: Set(from.to_string()),
        to_location: Set(to.to_string()),
        quantity: Set(quantity),
        remarks: Set(request.remarks.clone()),
        user_id: Set(actor.user_id.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let reference = Some(format!("stock_transfer:{}", transfer.id));
    for (location, change_qty, movement_type) in [
        (from, -quantity, MovementType::TransferOut),
        (to, quantity, MovementType::TransferIn),
    ] {
        journal::record_movement(
            &txn,
            MovementEntry {
                product_id,
                location,
                change_qty,
                movement_type,
                invoice_id: None,
                reference: reference.clone(),
                user_id: &actor.user_id,
            },
        )
        .await?;
    }

    txn.commit().await?;
    info!(transfer_id = transfer.id, from, to, quantity, "Stock transferred");
    Ok(transfer)
}

/// Goods received from a supplier.
#[derive(Debug, Clone)]
pub struct PurchaseEntry {
    /// Supplier the goods came from
    pub supplier_id: String,
    /// Received product
    pub product_id: i64,
    /// Receiving location
    pub location: String,
    /// Received quantity
    pub quantity: f64,
    /// Supplier bill or bill-of-entry number
    pub bill_no: Option<String>,
    /// Amount paid for the goods
    pub purchase_amount: Option<f64>,
    /// Amount paid for freight
    pub freight_amount: Option<f64>,
    /// Receipt date
    pub date: NaiveDate,
}

/// The rows a receipt wrote, and the expenses it implies.
#[derive(Debug, Clone)]
pub struct ReceiptOutcome {
    /// Receipt document
    pub receipt: stock_receipt::Model,
    /// Inbound movement
    pub movement: stock_movement::Model,
    /// Expenses for the caller to record with
    /// [`record_expense_events`](crate::core::expense::record_expense_events)
    pub expense_events: Vec<ExpenseEvent>,
}

/// Records imported goods.
///
/// # Errors
/// As [`add_local_purchase`].
pub async fn add_import_entry(
    db: &DatabaseConnection,
    actor: &Actor,
    entry: PurchaseEntry,
) -> Result<ReceiptOutcome> {
    receive(db, actor, ReceiptSource::Import, entry).await
}

/// Records goods bought from a local supplier.
///
/// # Errors
/// `Validation` for a blank supplier or location, a non-positive quantity or a
/// negative amount; `NotFound` for a missing product.
pub async fn add_local_purchase(
    db: &DatabaseConnection,
    actor: &Actor,
    entry: PurchaseEntry,
) -> Result<ReceiptOutcome> {
    receive(db, actor, ReceiptSource::LocalPurchase, entry).await
}

fn validate_amount(amount: Option<f64>) -> Result<Option<f64>> {
    match amount {
        Some(a) if !a.is_finite() || a < 0.0 => Err(Error::InvalidAmount { amount: a }),
        other => Ok(other),
    }
}

/// Expenses a receipt implies; zero or absent amounts imply nothing.
fn implied_expenses(
    source: ReceiptSource,
    receipt: &stock_receipt::Model,
    product_name: &str,
) -> Vec<ExpenseEvent> {
    let label = match source {
        ReceiptSource::Import => "Import",
        ReceiptSource::LocalPurchase => "Local purchase",
    };
    let reference = Some(format!("stock_receipt:{}", receipt.id));

    [
        (PURCHASE_CATEGORY, receipt.purchase_amount, "purchase"),
        (FREIGHT_CATEGORY, receipt.freight_amount, "freight"),
    ]
    .into_iter()
    .filter_map(|(category, amount, what)| {
        amount.filter(|a| *a > 0.0).map(|amount| ExpenseEvent {
            category: category.to_string(),
            amount,
            description: format!(
                "{label} {what}: {product_name} from {}",
                receipt.supplier_id
            ),
            reference: reference.clone(),
            date: receipt.receipt_date,
        })
    })
    .collect()
}

#[instrument(skip(db, actor, entry), fields(product_id = entry.product_id))]
async fn receive(
    db: &DatabaseConnection,
    actor: &Actor,
    source: ReceiptSource,
    entry: PurchaseEntry,
) -> Result<ReceiptOutcome> {
    let location = require_location(&entry.location)?;
    let quantity = require_positive(entry.quantity)?;
    if entry.supplier_id.trim().is_empty() {
        return Err(Error::validation("Supplier is required"));
    }
    let purchase_amount = validate_amount(entry.purchase_amount)?;
    let freight_amount = validate_amount(entry.freight_amount)?;
    let product_id = entry.product_id;

    let txn = db.begin().await?;
    let mut book = product::load_stock_book(&txn, [product_id]).await?;
    let product_name = book.get(product_id)?.product.name.clone();
    book.credit(product_id, location, quantity)?;

    product::write_stock_book(&txn, &book).await?;
    let receipt = stock_receipt::ActiveModel {
        source: Set(source),
        supplier_id: Set(entry.supplier_id.trim().to_string()),
        product_id: Set(product_id),
        location: Set(location.to_string()),
        quantity: Set(quantity),
        bill_no: Set(entry.bill_no),
        purchase_amount: Set(purchase_amount),
        freight_amount: Set(freight_amount),
        receipt_date: Set(entry.date),
        user_id: Set(actor.user_id.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let movement_type = match source {
        ReceiptSource::Import => MovementType::Import,
        ReceiptSource::LocalPurchase => MovementType::LocalPurchase,
    };
    let movement = journal::record_movement(
        &txn,
        MovementEntry {
            product_id,
            location,
            change_qty: quantity,
            movement_type,
            invoice_id: None,
            reference: Some(format!("stock_receipt:{}", receipt.id)),
            user_id: &actor.user_id,
        },
    )
    .await?;

    txn.commit().await?;

    let expense_events = implied_expenses(source, &receipt, &product_name);
    info!(
        receipt_id = receipt.id,
        location,
        quantity,
        expenses = expense_events.len(),
        "Stock received"
    );
    Ok(ReceiptOutcome {
        receipt,
        movement,
        expense_events,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{
            expense::{list_expenses, record_expense_events},
            journal::movements_for_product,
            product::get_stock_levels,
        },
        entities::{StockMovement, StockTransfer},
        errors::ErrorKind,
        test_utils::*,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn transfer(product_id: i64, from: &str, to: &str, quantity: f64) -> TransferRequest {
        TransferRequest {
            product_id,
            from_location: from.to_string(),
            to_location: to.to_string(),
            quantity,
            remarks: None,
        }
    }

    fn purchase(
        product_id: i64,
        purchase_amount: Option<f64>,
        freight: Option<f64>,
    ) -> PurchaseEntry {
        PurchaseEntry {
            supplier_id: "SUP-1".to_string(),
            product_id,
            location: "WH1".to_string(),
            quantity: 25.0,
            bill_no: Some("B-17".to_string()),
            purchase_amount,
            freight_amount: freight,
            date: test_date(),
        }
    }

    #[tokio::test]
    async fn test_input_validation_runs_before_queries() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let actor = staff();

        let err = add_stock(&db, &actor, 1, "WH1", 0.0, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = add_stock(&db, &actor, 1, " ", 5.0, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = update_stock_level(&db, &actor, 1, "WH1", -1.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = transfer_stock(&db, &actor, transfer(1, "WH1", "WH1", 5.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = add_import_entry(&db, &actor, purchase(1, Some(-3.0), None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_add_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Cement", &[("WH1", 10.0)]).await?;

        let movement = add_stock(
            &db,
            &staff(),
            p.id,
            "WH1",
            5.25,
            Some("Opening".to_string()),
        )
        .await?;
        assert_eq!(movement.movement_type, MovementType::StockEntry);
        assert_eq!(movement.change_qty, 5.3);
        assert_eq!(get_stock_levels(&db, p.id).await?.get("WH1"), Some(&15.3));
        assert_eq!(stock_qty(&db, p.id).await?, 15.3);

        let err = add_stock(&db, &staff(), 999, "WH1", 1.0, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_stock_level_logs_delta() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Cement", &[("WH1", 40.0), ("Plant", 5.0)]).await?;

        let movement = update_stock_level(&db, &staff(), p.id, "WH1", 32.0, None).await?;
        assert_eq!(movement.change_qty, -8.0);
        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert_eq!(stock_qty(&db, p.id).await?, 37.0);

        // Unchanged level still leaves an audit row
        let movement = update_stock_level(&db, &staff(), p.id, "WH1", 32.0, None).await?;
        assert_eq!(movement.change_qty, 0.0);
        assert_eq!(movements_for_product(&db, p.id).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Cement", &[("WH1", 40.0)]).await?;

        let record = transfer_stock(&db, &staff(), transfer(p.id, "WH1", "Plant", 15.0)).await?;
        assert_eq!(record.quantity, 15.0);

        let levels = get_stock_levels(&db, p.id).await?;
        assert_eq!(levels.get("WH1"), Some(&25.0));
        assert_eq!(levels.get("Plant"), Some(&15.0));
        assert_eq!(stock_qty(&db, p.id).await?, 40.0);

        let history = movements_for_product(&db, p.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].movement_type, MovementType::TransferIn);
        assert_eq!(history[1].movement_type, MovementType::TransferOut);
        assert_eq!(history[1].change_qty, -15.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_never_overdraws() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Cement", &[("WH1", 10.0)]).await?;
        crate::core::settings::set_allow_negative_stock(&db, true).await?;

        let err = transfer_stock(&db, &staff(), transfer(p.id, "WH1", "Plant", 11.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientStock { available, .. } if available == 10.0));
        assert_eq!(StockTransfer::find().count(&db).await?, 0);
        assert_eq!(StockMovement::find().count(&db).await?, 0);
        assert_eq!(get_stock_levels(&db, p.id).await?.get("WH1"), Some(&10.0));

        Ok(())
    }

    #[tokio::test]
    async fn test_import_emits_expense_events() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Cement", &[]).await?;

        let outcome =
            add_import_entry(&db, &staff(), purchase(p.id, Some(5000.0), Some(250.0))).await?;
        assert_eq!(outcome.receipt.source, ReceiptSource::Import);
        assert_eq!(outcome.movement.movement_type, MovementType::Import);
        assert_eq!(outcome.movement.change_qty, 25.0);
        assert_eq!(get_stock_levels(&db, p.id).await?.get("WH1"), Some(&25.0));

        assert_eq!(outcome.expense_events.len(), 2);
        assert_eq!(outcome.expense_events[0].category, PURCHASE_CATEGORY);
        assert_eq!(outcome.expense_events[0].amount, 5000.0);
        assert_eq!(outcome.expense_events[1].category, FREIGHT_CATEGORY);
        let reference = format!("stock_receipt:{}", outcome.receipt.id);
        assert_eq!(outcome.expense_events[1].reference.as_deref(), Some(reference.as_str()));

        // Receipts leave the expense ledger alone until the caller records them
        assert!(list_expenses(&db).await?.is_empty());
        record_expense_events(&db, &staff(), &outcome.expense_events).await?;
        assert_eq!(list_expenses(&db).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_local_purchase_without_amounts() -> Result<()> {
        let db = setup_test_db().await?;
        let p = create_stocked_product(&db, "Sand", &[("WH1", 5.0)]).await?;

        let outcome = add_local_purchase(&db, &staff(), purchase(p.id, None, Some(0.0))).await?;
        assert_eq!(outcome.receipt.source, ReceiptSource::LocalPurchase);
        assert_eq!(outcome.movement.movement_type, MovementType::LocalPurchase);
        assert!(outcome.expense_events.is_empty());
        assert_eq!(stock_qty(&db, p.id).await?, 30.0);

        Ok(())
    }
}
