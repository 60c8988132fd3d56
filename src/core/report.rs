//! Stock report generation.
//!
//! This module builds per-product and per-location stock summaries. All
//! functions return structured data; [`format_stock_report`] renders it as a
//! plain text table for logs.

use crate::{
    core::{ledger::Locations, product::get_all_products, quantity::round1},
    entities::{ProductStock, product},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::fmt::Write as _;

/// One product's stock across every location it has been stocked at.
#[derive(Debug, Clone)]
pub struct StockReportRow {
    /// The product being reported on
    pub product: product::Model,
    /// Quantity per location
    pub locations: Locations,
    /// Cached total, equal to the sum of `locations`
    pub total: f64,
}

/// Generates a stock report for every product, ordered by name.
pub async fn stock_report(db: &DatabaseConnection) -> Result<Vec<StockReportRow>> {
    let products = get_all_products(db).await?;
    let rows = ProductStock::find().all(db).await?;

    Ok(products
        .into_iter()
        .map(|product| {
            let locations: Locations = rows
                .iter()
                .filter(|r| r.product_id == product.id)
                .map(|r| (r.location.clone(), r.quantity))
                .collect();
            StockReportRow {
                total: product.stock_qty,
                locations,
                product,
            }
        })
        .collect())
}

/// Sums stock per location across all products.
pub async fn location_totals(db: &DatabaseConnection) -> Result<Locations> {
    let rows = ProductStock::find().all(db).await?;
    let mut totals = Locations::new();
    for row in rows {
        let entry = totals.entry(row.location).or_insert(0.0);
        *entry = round1(*entry + row.quantity);
    }
    Ok(totals)
}

/// Formats a quantity with one decimal, the precision stock is kept at.
#[must_use]
pub fn format_quantity(quantity: f64) -> String {
    format!("{quantity:.1}")
}

/// Renders a report as a text table with one column per location.
///
/// Columns follow `locations` first, then any other location that appears in
/// the rows, alphabetically.
#[must_use]
pub fn format_stock_report(rows: &[StockReportRow], locations: &[String]) -> String {
    let mut columns: Vec<&str> = locations.iter().map(String::as_str).collect();
    for row in rows {
        for location in row.locations.keys() {
            if !columns.contains(&location.as_str()) {
                columns.push(location);
            }
        }
    }
    columns[locations.len()..].sort_unstable();

    let mut out = String::from("Product");
    for column in &columns {
        let _ = write!(out, " | {column}");
    }
    out.push_str(" | Total\n");

    for row in rows {
        out.push_str(&row.product.name);
        for column in &columns {
            let quantity = row.locations.get(*column).copied().unwrap_or(0.0);
            let _ = write!(out, " | {}", format_quantity(quantity));
        }
        let _ = writeln!(out, " | {}", format_quantity(row.total));
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(70.0), "70.0");
        assert_eq!(format_quantity(12.34), "12.3");
        assert_eq!(format_quantity(-3.0), "-3.0");
    }

    #[tokio::test]
    async fn test_stock_report_and_totals() -> Result<()> {
        let db = setup_test_db().await?;
        create_stocked_product(&db, "Sand", &[("WH1", 12.5)]).await?;
        create_stocked_product(&db, "Cement", &[("WH1", 100.0), ("Plant", 7.5)]).await?;

        let report = stock_report(&db).await?;
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].product.name, "Cement");
        assert_eq!(report[0].total, 107.5);
        assert_eq!(report[0].locations.get("Plant"), Some(&7.5));
        assert_eq!(report[1].locations.get("WH1"), Some(&12.5));

        let totals = location_totals(&db).await?;
        assert_eq!(totals.get("WH1"), Some(&112.5));
        assert_eq!(totals.get("Plant"), Some(&7.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_format_stock_report() -> Result<()> {
        let db = setup_test_db().await?;
        create_stocked_product(&db, "Cement", &[("WH1", 100.0), ("Yard", 2.0)]).await?;

        let report = stock_report(&db).await?;
        let text = format_stock_report(&report, &["WH1".to_string(), "Plant".to_string()]);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Product | WH1 | Plant | Yard | Total");
        assert_eq!(lines[1], "Cement | 100.0 | 0.0 | 2.0 | 102.0");

        Ok(())
    }
}
