//! Application configuration loading from config.toml
//!
//! The file names the stock locations the business operates and the ledger
//! switches that are seeded into the `system_state` table on startup.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` takes precedence when set
    #[serde(default)]
    pub database_url: Option<String>,
    /// Known stock locations, in display order
    #[serde(default)]
    pub locations: Vec<String>,
    /// Ledger behaviour switches
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// `[ledger]` table
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct LedgerConfig {
    /// Let invoices draw a location below zero
    #[serde(default)]
    pub allow_negative_stock: bool,
}

impl AppConfig {
    /// Resolves the database URL: environment first, then the file, then the default.
    #[must_use]
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(crate::config::database::get_database_url)
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A location name is empty
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses configuration text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.locations.iter().any(|l| l.trim().is_empty()) {
        return Err(Error::Config {
            message: "Location names cannot be empty".to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<AppConfig> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_app_config() {
        let toml_str = r#"
            database_url = "sqlite://data/test.sqlite?mode=rwc"
            locations = ["Main Warehouse", "Plant", "Yard"]

            [ledger]
            allow_negative_stock = true
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.locations.len(), 3);
        assert_eq!(config.locations[1], "Plant");
        assert!(config.ledger.allow_negative_stock);
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://data/test.sqlite?mode=rwc")
        );
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.locations.is_empty());
        assert!(!config.ledger.allow_negative_stock);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_rejects_blank_location() {
        let result = parse_config(r#"locations = ["WH1", "  "]"#);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
