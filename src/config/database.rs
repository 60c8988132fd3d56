//! Database configuration module for the inventory ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.

use crate::entities::{
    Dispatch, Expense, Invoice, InvoiceItem, InvoiceNumber, PoFulfillment, Product, ProductStock,
    PurchaseOrder, PurchaseOrderItem, RecycleBin, StockMovement, StockReceipt, StockTransfer,
    SystemState,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/stockbook.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Connects to the database at `url`.
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    tracing::debug!("Connecting to database at {url}");
    Database::connect(url).await.map_err(Into::into)
}

/// Establishes a connection using `DATABASE_URL` (or the default local file).
pub async fn create_connection() -> Result<DatabaseConnection> {
    connect(&get_database_url()).await
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every ledger table that does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Product).await?;
    create_table(db, &schema, ProductStock).await?;
    create_table(db, &schema, PurchaseOrder).await?;
    create_table(db, &schema, PurchaseOrderItem).await?;
    create_table(db, &schema, PoFulfillment).await?;
    create_table(db, &schema, Invoice).await?;
    create_table(db, &schema, InvoiceNumber).await?;
    create_table(db, &schema, InvoiceItem).await?;
    create_table(db, &schema, StockMovement).await?;
    create_table(db, &schema, Dispatch).await?;
    create_table(db, &schema, RecycleBin).await?;
    create_table(db, &schema, StockTransfer).await?;
    create_table(db, &schema, StockReceipt).await?;
    create_table(db, &schema, Expense).await?;
    create_table(db, &schema, SystemState).await?;

    tracing::debug!("Ledger tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{InvoiceModel, ProductModel, RecycleBinModel, SystemStateModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<InvoiceModel> = Invoice::find().limit(1).all(&db).await?;
        let _: Vec<RecycleBinModel> = RecycleBin::find().limit(1).all(&db).await?;
        let _: Vec<SystemStateModel> = SystemState::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
