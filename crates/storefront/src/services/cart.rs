//! Cart service.
//!
//! Applies the merge rules from [`cartline_core::cart`] to persisted carts.
//! Every mutation is a read-modify-write of the whole cart document:
//! load, change in memory, save.
//!
//! How concurrent mutations of one cart are ordered is chosen explicitly with
//! [`CartConsistency`]. `Serialized` holds a per-account async mutex for the
//! whole read-modify-write; `LastWriteWins` takes no lock and lets a later
//! save overwrite an earlier one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cartline_core::cart::validate_quantity;
use cartline_core::{AccountId, Cart, CartError, NewCartItem, ProductId};

use crate::config::CartConsistency;
use crate::db::{CartStore, RepositoryError};

/// Idle time after which an account's cart lock is dropped.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// A merge rule rejected the operation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The cart store failed.
    #[error("cart store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart operations over a [`CartStore`].
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    consistency: CartConsistency,
    locks: Cache<AccountId, Arc<Mutex<()>>>,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, consistency: CartConsistency) -> Self {
        let locks = Cache::builder().time_to_idle(LOCK_IDLE_TIMEOUT).build();

        Self {
            store,
            consistency,
            locks,
        }
    }

    async fn lock(&self, owner: AccountId) -> Option<OwnedMutexGuard<()>> {
        match self.consistency {
            CartConsistency::Serialized => {
                let lock = self
                    .locks
                    .get_with(owner, async { Arc::new(Mutex::new(())) })
                    .await;
                Some(lock.lock_owned().await)
            }
            CartConsistency::LastWriteWins => None,
        }
    }

    /// Return the owner's cart, or an unsaved empty cart if none exists.
    ///
    /// Never creates a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the store fails.
    pub async fn view(&self, owner: AccountId) -> Result<Cart, CartServiceError> {
        Ok(self
            .store
            .get(owner)
            .await?
            .unwrap_or_else(|| Cart::empty(owner)))
    }

    /// Add one unit of a product, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the store fails.
    pub async fn add(
        &self,
        owner: AccountId,
        item: NewCartItem,
    ) -> Result<Cart, CartServiceError> {
        let _guard = self.lock(owner).await;
        let now = Utc::now();

        let mut cart = self
            .store
            .get(owner)
            .await?
            .unwrap_or_else(|| Cart::new(owner, now));

        tracing::debug!(account_id = %owner, product_id = %item.product_id, "Adding to cart");
        cart.add_item(item, now);
        self.store.save(&cart).await?;

        Ok(cart)
    }

    /// Set the quantity of an existing line.
    ///
    /// The quantity is checked before the store is touched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1,
    /// `CartError::CartNotFound` if the owner has no cart and
    /// `CartError::ItemNotFound` if the product is not in it.
    pub async fn set_quantity(
        &self,
        owner: AccountId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartServiceError> {
        validate_quantity(quantity)?;

        let _guard = self.lock(owner).await;
        let mut cart = self
            .store
            .get(owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        cart.set_quantity(product_id, quantity, Utc::now())?;
        self.store.save(&cart).await?;

        Ok(cart)
    }

    /// Remove a product's line. Removing an absent product succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the owner has no cart.
    pub async fn remove(
        &self,
        owner: AccountId,
        product_id: ProductId,
    ) -> Result<Cart, CartServiceError> {
        let _guard = self.lock(owner).await;
        let mut cart = self
            .store
            .get(owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if !cart.remove_item(product_id, Utc::now()) {
            tracing::debug!(account_id = %owner, product_id = %product_id, "Remove of absent cart item");
        }
        self.store.save(&cart).await?;

        Ok(cart)
    }
}
