//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::db::{
    AccountStore, CartStore, MemoryAccountStore, MemoryCartStore, PgAccountStore, PgCartStore,
};
use crate::middleware::SessionCookies;
use crate::services::{
    AuthService, CartService, Clock, PasswordError, PasswordHasher, SystemClock, TokenService,
};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("password hasher: {0}")]
    Password(#[from] PasswordError),
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
}

/// Where accounts and carts are persisted.
#[derive(Clone)]
pub enum Storage {
    /// `PostgreSQL` through a shared pool.
    Postgres(PgPool),
    /// Process-local maps.
    Memory {
        accounts: Arc<MemoryAccountStore>,
        carts: Arc<MemoryCartStore>,
    },
}

impl Storage {
    /// Fresh, empty in-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory {
            accounts: Arc::new(MemoryAccountStore::new()),
            carts: Arc::new(MemoryCartStore::new()),
        }
    }

    fn stores(&self) -> (Arc<dyn AccountStore>, Arc<dyn CartStore>) {
        match self {
            Self::Postgres(pool) => {
                let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
                let carts: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
                (accounts, carts)
            }
            Self::Memory { accounts, carts } => {
                let accounts: Arc<dyn AccountStore> = accounts.clone();
                let carts: Arc<dyn CartStore> = carts.clone();
                (accounts, carts)
            }
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the services, storage and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Storage,
    auth: AuthService,
    carts: CartService,
    tokens: TokenService,
    cookies: SessionCookies,
    catalog: CatalogClient,
}

impl AppState {
    /// Create a new application state using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the hashing parameters or catalog base URL are unusable.
    pub fn new(config: StorefrontConfig, storage: Storage) -> Result<Self, StateError> {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    /// Create a new application state with an explicit clock for token expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the hashing parameters or catalog base URL are unusable.
    pub fn with_clock(
        config: StorefrontConfig,
        storage: Storage,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StateError> {
        let (accounts, carts) = storage.stores();

        let tokens = TokenService::with_clock(&config.token_secret, clock);
        let hasher = PasswordHasher::new(&config.password_hashing)?;
        let auth = AuthService::new(accounts, hasher, tokens.clone());
        let carts = CartService::new(carts, config.cart_consistency);
        let cookies = SessionCookies::from_config(&config);
        let catalog = CatalogClient::new(&config.catalog)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                auth,
                carts,
                tokens,
                cookies,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, if running on `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        match &self.inner.storage {
            Storage::Postgres(pool) => Some(pool),
            Storage::Memory { .. } => None,
        }
    }

    /// Get the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get the session token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the session cookie builder.
    #[must_use]
    pub fn cookies(&self) -> &SessionCookies {
        &self.inner.cookies
    }

    /// Get the Catalog Provider client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }
}
