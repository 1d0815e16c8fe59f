//! CLI subcommand implementations.

pub mod account;
pub mod migrate;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by commands that talk to the storefront database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Neither database variable is set.
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Storefront configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] cartline_storefront::config::ConfigError),

    /// Account provisioning was refused.
    #[error("{0}")]
    Account(#[from] cartline_storefront::services::AuthError),
}

/// Read the storefront database URL, preferring the storefront-specific variable.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingDatabaseUrl)
}
