//! Product business logic - product records and their per-location stock.
//!
//! Stock rows are only changed through [`write_stock`], which also recomputes the
//! cached `stock_qty` from the location quantities. Nothing else in the crate sets
//! `stock_qty`.

use crate::{
    core::{
        ledger::{Locations, ProductStock, StockBook},
        quantity::round1,
    },
    entities::{Product, ProductStock as ProductStockEntity, product, product_stock},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeSet;

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Stock keeping unit code
    pub sku: String,
    /// HSN tax classification code
    pub hsn_code: String,
    /// Default unit price
    pub price: f64,
}

/// Creates a product with no stock anywhere.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The database insert operation fails
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }

    if input.price < 0.0 || !input.price.is_finite() {
        return Err(Error::InvalidAmount {
            amount: input.price,
        });
    }

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(input.name.trim().to_string()),
        sku: Set(input.sku.trim().to_string()),
        hsn_code: Set(input.hsn_code.trim().to_string()),
        price: Set(input.price),
        stock_qty: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Retrieves a product by id.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every product, ordered alphabetically by name.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reads the per-location quantities of one product.
pub async fn get_stock_levels<C>(db: &C, product_id: i64) -> Result<Locations>
where
    C: ConnectionTrait,
{
    let rows = ProductStockEntity::find()
        .filter(product_stock::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| (r.location, r.quantity)).collect())
}

/// Reads the given products and their stock rows into a [`StockBook`].
///
/// # Errors
/// Returns `NotFound` naming the first id that does not exist.
pub async fn load_stock_book<C, I>(db: &C, product_ids: I) -> Result<StockBook>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i64>,
{
    let ids: BTreeSet<i64> = product_ids.into_iter().collect();
    let mut book = StockBook::new();
    if ids.is_empty() {
        return Ok(book);
    }

    let products = Product::find()
        .filter(product::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    let rows = ProductStockEntity::find()
        .filter(product_stock::Column::ProductId.is_in(ids.iter().copied()))
        .all(db)
        .await?;

    for id in &ids {
        let product = products
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| Error::not_found("Product", id))?;
        let locations: Locations = rows
            .iter()
            .filter(|r| r.product_id == *id)
            .map(|r| (r.location.clone(), r.quantity))
            .collect();
        book.insert(ProductStock::new(product, locations));
    }

    Ok(book)
}

/// Writes a product's changed locations and refreshes its cached total.
///
/// Location rows are upserted one by one; `stock_qty` is set to the rounded sum
/// of every location.
pub async fn write_stock<C>(db: &C, stock: &ProductStock) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let product_id = stock.product.id;

    for (location, quantity) in stock.changed_locations() {
        let existing = ProductStockEntity::find()
            .filter(product_stock::Column::ProductId.eq(product_id))
            .filter(product_stock::Column::Location.eq(location))
            .one(db)
            .await?;

        match existing {
            Some(row) => {
                let mut row: product_stock::ActiveModel = row.into();
                row.quantity = Set(round1(quantity));
                row.update(db).await?;
            }
            None => {
                product_stock::ActiveModel {
                    product_id: Set(product_id),
                    location: Set(location.to_string()),
                    quantity: Set(round1(quantity)),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
    }

    let mut product: product::ActiveModel = stock.product.clone().into();
    product.stock_qty = Set(stock.total());
    product.updated_at = Set(chrono::Utc::now());
    product.update(db).await.map_err(Into::into)
}

/// Writes every changed product in the book.
pub async fn write_stock_book<C>(db: &C, book: &StockBook) -> Result<()>
where
    C: ConnectionTrait,
{
    for stock in book.touched() {
        write_stock(db, stock).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ledger::StockPolicy;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_product("   ");
        let result = create_product(&db, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        input = new_product("Cement");
        input.price = -1.0;
        let result = create_product(&db, input.clone()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -1.0 }
        ));

        input.price = f64::NAN;
        let result = create_product(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_starts_empty() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_product(&db, new_product("  Cement ")).await?;
        assert_eq!(product.name, "Cement");
        assert_eq!(product.stock_qty, 0.0);
        assert!(get_stock_levels(&db, product.id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_products_sorted() -> Result<()> {
        let db = setup_test_db().await?;
        create_product(&db, new_product("Steel")).await?;
        create_product(&db, new_product("Cement")).await?;

        let names: Vec<String> = get_all_products(&db)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Cement", "Steel"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_write_stock_recomputes_total() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "Cement", &[("WH1", 100.0)]).await?;

        let mut book = load_stock_book(&db, [product.id]).await?;
        book.debit(product.id, "WH1", 30.0, StockPolicy::Strict)?;
        book.credit(product.id, "Plant", 12.5)?;
        write_stock_book(&db, &book).await?;

        let levels = get_stock_levels(&db, product.id).await?;
        assert_eq!(levels.get("WH1"), Some(&70.0));
        assert_eq!(levels.get("Plant"), Some(&12.5));

        let stored = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(stored.stock_qty, 82.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_load_stock_book_missing_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "Cement", &[("WH1", 1.0)]).await?;

        let err = load_stock_book(&db, [product.id, 999]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { entity: "Product", ref id } if id == "999"
        ));

        Ok(())
    }
}
