use dotenvy::dotenv;
use stockbook::{
    config::{database, settings::load_default_config},
    core::{report, settings::seed_settings},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    info!(locations = app_config.locations.len(), "Configuration loaded");

    // 4. Connect and make sure every ledger table exists
    let db = database::connect(&app_config.database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed settings that are not stored yet
    seed_settings(&db, &app_config).await?;

    // 6. Log current stock
    let rows = report::stock_report(&db).await?;
    let totals = report::location_totals(&db).await?;
    info!(
        products = rows.len(),
        locations = totals.len(),
        "Stock report\n{}",
        report::format_stock_report(&rows, &app_config.locations)
    );

    Ok(())
}
