//! Shared test utilities for the inventory ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        actor::{Actor, Role},
        invoice::{InvoiceHeader, InvoiceLine},
        product::{self, NewProduct},
        purchase_order::{self, NewOrderLine, NewPurchaseOrder, PurchaseOrderDetail},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// The date every test invoice and purchase order is stamped with.
#[must_use]
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or_default()
}

/// A staff caller, `"clerk"`.
#[must_use]
pub fn staff() -> Actor {
    Actor::new("clerk", Role::Staff)
}

/// An admin caller, `"owner"`.
#[must_use]
pub fn admin() -> Actor {
    Actor::new("owner", Role::Admin)
}

/// Product input with sensible defaults.
///
/// # Defaults
/// * `sku`: the name in upper case
/// * `hsn_code`: `"2523"`
/// * `price`: 10.0
#[must_use]
pub fn new_product(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        sku: name.to_uppercase(),
        hsn_code: "2523".to_string(),
        price: 10.0,
    }
}

/// Creates a product holding the given stock, without writing movement rows.
pub async fn create_stocked_product(
    db: &DatabaseConnection,
    name: &str,
    stock: &[(&str, f64)],
) -> Result<entities::product::Model> {
    let created = product::create_product(db, new_product(name)).await?;
    if stock.is_empty() {
        return Ok(created);
    }

    let mut book = product::load_stock_book(db, [created.id]).await?;
    for (location, quantity) in stock {
        book.credit(created.id, location, *quantity)?;
    }
    product::write_stock_book(db, &book).await?;

    Ok(product::get_product_by_id(db, created.id)
        .await?
        .unwrap_or(created))
}

/// Reads a product's cached `stock_qty`.
pub async fn stock_qty(db: &DatabaseConnection, product_id: i64) -> Result<f64> {
    Ok(product::get_product_by_id(db, product_id)
        .await?
        .map_or(0.0, |p| p.stock_qty))
}

/// Purchase order input for customer `"CUST-1"`, one line per `(product, qty)`.
#[must_use]
pub fn new_purchase_order(po_number: &str, lines: &[(i64, f64)]) -> NewPurchaseOrder {
    NewPurchaseOrder {
        po_number: po_number.to_string(),
        customer_id: "CUST-1".to_string(),
        date: test_date(),
        items: lines
            .iter()
            .map(|(product_id, total_qty)| NewOrderLine {
                product_id: *product_id,
                total_qty: *total_qty,
                rate: 10.0,
            })
            .collect(),
    }
}

/// Creates a purchase order via [`new_purchase_order`].
pub async fn create_test_purchase_order(
    db: &DatabaseConnection,
    po_number: &str,
    lines: &[(i64, f64)],
) -> Result<PurchaseOrderDetail> {
    purchase_order::create_purchase_order(db, new_purchase_order(po_number, lines)).await
}

/// Invoice header for customer `"CUST-1"` at 18% tax.
#[must_use]
pub fn header(invoice_no: &str) -> InvoiceHeader {
    InvoiceHeader {
        invoice_no: invoice_no.to_string(),
        customer_id: "CUST-1".to_string(),
        customer_name: "Acme Builders".to_string(),
        invoice_date: test_date(),
        tax_rate: 18.0,
        transporter: Some("Fast Freight".to_string()),
        vehicle_no: Some("KA-01-1234".to_string()),
        remarks: None,
    }
}

/// An invoice line at the product's own price.
#[must_use]
pub fn line(product_id: i64, quantity: &str) -> InvoiceLine {
    InvoiceLine {
        product_id,
        quantity: quantity.to_string(),
        price: None,
        purchase_order_id: None,
    }
}

/// An invoice line fulfilling a purchase order.
#[must_use]
pub fn po_line(product_id: i64, quantity: &str, purchase_order_id: i64) -> InvoiceLine {
    InvoiceLine {
        purchase_order_id: Some(purchase_order_id),
        ..line(product_id, quantity)
    }
}
