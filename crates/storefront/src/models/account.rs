//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartline_core::{AccountId, Email};

/// A registered storefront account (domain type).
///
/// The password hash is deliberately absent; it is only read during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// System-generated identity.
    pub id: AccountId,
    /// Email exactly as registered.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The public view of this account.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// Account data exposed to clients (`user: {email, id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub email: Email,
    pub id: AccountId,
}
