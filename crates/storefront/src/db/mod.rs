//! Persistence for accounts and carts.
//!
//! # Database: `cartline`
//!
//! ## Tables
//!
//! - `storefront.account` - Credential store (email, Argon2 hash)
//! - `storefront.cart` - One cart document per account (items as JSONB)
//!
//! Every store is reached through the [`AccountStore`] and [`CartStore`]
//! traits. `PostgreSQL` backs them in production; the in-memory stores in
//! [`memory`] back them when no database URL is configured.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartline-cli -- migrate
//! ```

pub mod accounts;
pub mod carts;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartline_core::{AccountId, Cart, Email};

use crate::models::Account;

pub use accounts::PgAccountStore;
pub use carts::PgCartStore;
pub use memory::{MemoryAccountStore, MemoryCartStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Account records and their password hashes.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, email: &Email, password_hash: &str)
    -> Result<Account, RepositoryError>;

    /// Look up an account by exact email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    /// Look up an account by identity.
    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Look up an account together with its stored password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError>;
}

/// Whole-document cart persistence, one cart per account.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the cart owned by `owner`, if one was ever saved.
    async fn get(&self, owner: AccountId) -> Result<Option<Cart>, RepositoryError>;

    /// Insert or replace the cart document for `cart.owner`.
    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
