//! Cart documents and their merge rules.
//!
//! A [`Cart`] belongs to exactly one account and holds its lines in insertion
//! order. Lines are keyed by [`ProductId`]: adding a product that is already in
//! the cart bumps the existing line instead of creating a second one.
//!
//! The functions here are pure. Loading and persisting carts, and deciding how
//! concurrent mutations of the same cart are ordered, is the storefront's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Price, ProductId};

/// Errors produced by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The account has never created a cart.
    #[error("cart not found")]
    CartNotFound,

    /// No line for this product exists in the cart.
    #[error("item {0} not found in cart")]
    ItemNotFound(ProductId),

    /// Quantities must be at least 1; removal is a separate operation.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),
}

/// One product line within a cart.
///
/// `title`, `price` and `thumbnail` are captured when the product is first
/// added and are never refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub title: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Product data supplied by the client when adding to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub thumbnail: Option<String>,
}

/// A per-account shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Owning account.
    #[serde(rename = "user")]
    pub owner: AccountId,
    /// Lines in insertion order, at most one per product.
    pub items: Vec<CartItem>,
    /// Set once the cart has been persisted; `None` for the synthetic empty cart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// A cart that is about to be persisted for the first time.
    #[must_use]
    pub const fn new(owner: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            owner,
            items: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// The read-only placeholder returned when an account has no cart yet.
    #[must_use]
    pub const fn empty(owner: AccountId) -> Self {
        Self {
            owner,
            items: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Add one unit of a product.
    ///
    /// An existing line keeps its original title/price/thumbnail and has its
    /// quantity incremented; otherwise a new line with quantity 1 is appended.
    pub fn add_item(&mut self, new: NewCartItem, now: DateTime<Utc>) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == new.product_id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                product_id: new.product_id,
                quantity: 1,
                title: new.title,
                price: new.price,
                thumbnail: new.thumbnail,
            }),
        }
        self.updated_at = Some(now);
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is below 1 (or does
    /// not fit a line quantity), and `CartError::ItemNotFound` if the product
    /// has no line in this cart.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        let quantity = validate_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;

        line.quantity = quantity;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Drop every line for a product. Returns whether anything was removed.
    ///
    /// Removing an absent product is not an error.
    pub fn remove_item(&mut self, product_id: ProductId, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.updated_at = Some(now);
        self.items.len() != before
    }
}

/// Check that a requested line quantity is usable.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` for values below 1 or above `u32::MAX`.
pub fn validate_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))
}
