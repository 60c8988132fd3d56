//! Ledger settings stored in the `system_state` table.
//!
//! The only switch today is `allow_negative_stock`, which lets invoices draw a
//! location below zero. It is seeded from `config.toml` on startup and read
//! before each invoice transaction opens.

use crate::{
    config::settings::AppConfig,
    core::ledger::StockPolicy,
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

const ALLOW_NEGATIVE_STOCK_KEY: &str = "allow_negative_stock";

async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?
        .map(|s| s.value))
}

async fn set_value<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Reads the `allow_negative_stock` switch; absent means `false`.
pub async fn allow_negative_stock<C>(db: &C) -> Result<bool>
where
    C: ConnectionTrait,
{
    match get_value(db, ALLOW_NEGATIVE_STOCK_KEY).await? {
        Some(value) => value.parse::<bool>().map_err(|e| Error::Config {
            message: format!("Invalid {ALLOW_NEGATIVE_STOCK_KEY} value '{value}': {e}"),
        }),
        None => Ok(false),
    }
}

/// Writes the `allow_negative_stock` switch.
pub async fn set_allow_negative_stock<C>(db: &C, allow: bool) -> Result<()>
where
    C: ConnectionTrait,
{
    set_value(db, ALLOW_NEGATIVE_STOCK_KEY, allow.to_string()).await?;
    tracing::info!(allow, "allow_negative_stock updated");
    Ok(())
}

/// The stock policy invoice transactions run under.
pub async fn stock_policy<C>(db: &C) -> Result<StockPolicy>
where
    C: ConnectionTrait,
{
    Ok(StockPolicy::from_allow_negative(
        allow_negative_stock(db).await?,
    ))
}

/// Seeds settings from configuration, leaving values that already exist alone.
pub async fn seed_settings(db: &DatabaseConnection, config: &AppConfig) -> Result<()> {
    if get_value(db, ALLOW_NEGATIVE_STOCK_KEY).await?.is_none() {
        set_allow_negative_stock(db, config.ledger.allow_negative_stock).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LedgerConfig;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_allow_negative_stock_defaults_false() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!allow_negative_stock(&db).await?);
        assert_eq!(stock_policy(&db).await?, StockPolicy::Strict);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_allow_negative_stock_updates_existing() -> Result<()> {
        let db = setup_test_db().await?;

        set_allow_negative_stock(&db, true).await?;
        assert!(allow_negative_stock(&db).await?);

        set_allow_negative_stock(&db, false).await?;
        assert!(!allow_negative_stock(&db).await?);

        let rows = SystemState::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_settings_keeps_existing_value() -> Result<()> {
        let db = setup_test_db().await?;
        let config = AppConfig {
            ledger: LedgerConfig {
                allow_negative_stock: true,
            },
            ..AppConfig::default()
        };

        seed_settings(&db, &config).await?;
        assert!(allow_negative_stock(&db).await?);

        set_allow_negative_stock(&db, false).await?;
        seed_settings(&db, &config).await?;
        assert!(!allow_negative_stock(&db).await?);
        Ok(())
    }
}
