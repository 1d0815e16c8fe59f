//! Account provisioning commands.
//!
//! # Usage
//!
//! ```bash
//! cartline account create -e shopper@example.com -p 'correct horse'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_TOKEN_SECRET` - Session signing secret (same rules as the server)
//!
//! Accounts go through the same signup path as `POST /signup`, so email
//! validation, password length and Argon2 parameters all match. The email
//! is stored exactly as given.

use std::sync::Arc;

use cartline_storefront::config::StorefrontConfig;
use cartline_storefront::db::{self, PgAccountStore};
use cartline_storefront::services::{AuthService, PasswordHasher, TokenService};

use super::CommandError;

/// Create a storefront account and return its id.
pub async fn create(email: &str, password: &str) -> Result<i64, CommandError> {
    let config = StorefrontConfig::from_env()?;
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(CommandError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(database_url).await?;

    let hasher = PasswordHasher::new(&config.password_hashing)
        .map_err(cartline_storefront::services::AuthError::from)?;
    let auth = AuthService::new(
        Arc::new(PgAccountStore::new(pool)),
        hasher,
        TokenService::new(&config.token_secret),
    );

    let signed_in = auth.signup(email, password).await?;
    let account = signed_in.account;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}",
        account.id,
        account.email
    );

    Ok(account.id.as_i64())
}
