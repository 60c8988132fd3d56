/// Database connection and schema creation
pub mod database;

/// Application configuration loading from config.toml
pub mod settings;

/// Caller identity and privilege resolution from environment variables
pub mod users;
