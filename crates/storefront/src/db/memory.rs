//! In-memory stores for development and tests.
//!
//! Used when no database URL is configured. Data lives for the lifetime of
//! the process. The same uniqueness and whole-document semantics as the
//! `PostgreSQL` stores apply.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use cartline_core::{AccountId, Cart, Email};

use super::{AccountStore, CartStore, RepositoryError};
use crate::models::Account;

#[derive(Default)]
struct Accounts {
    next_id: i64,
    by_id: HashMap<AccountId, (Account, String)>,
    by_email: HashMap<Email, AccountId>,
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Accounts>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        // Check and insert under one write lock so duplicates cannot race in.
        let mut accounts = self.inner.write().await;
        if accounts.by_email.contains_key(email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        accounts.next_id += 1;
        let account = Account {
            id: AccountId::new(accounts.next_id),
            email: email.clone(),
            created_at: Utc::now(),
        };
        accounts.by_email.insert(email.clone(), account.id);
        accounts
            .by_id
            .insert(account.id, (account.clone(), password_hash.to_owned()));

        Ok(account)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .get_password_hash(email)
            .await?
            .map(|(account, _)| account))
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.inner.read().await;
        Ok(accounts.by_id.get(&id).map(|(account, _)| account.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let accounts = self.inner.read().await;
        Ok(accounts
            .by_email
            .get(email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }
}

/// In-memory cart store.
#[derive(Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<AccountId, Cart>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted carts.
    pub async fn len(&self) -> usize {
        self.carts.read().await.len()
    }

    /// Whether no cart has been persisted yet.
    pub async fn is_empty(&self) -> bool {
        self.carts.read().await.is_empty()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn get(&self, owner: AccountId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(&owner).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let mut stored = cart.clone();
        stored.created_at.get_or_insert(now);
        stored.updated_at.get_or_insert(now);

        self.carts.write().await.insert(cart.owner, stored);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryAccountStore::new();
        let email = Email::parse("a@x.com").unwrap();

        let first = store.create(&email, "hash").await.unwrap();
        let second = store.create(&email, "other-hash").await;

        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
        let (found, hash) = store.get_password_hash(&email).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryAccountStore::new();
        store
            .create(&Email::parse("a@x.com").unwrap(), "hash")
            .await
            .unwrap();

        let other_case = Email::parse("A@x.com").unwrap();
        assert!(store.get_by_email(&other_case).await.unwrap().is_none());
        assert!(store.create(&other_case, "hash").await.is_ok());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let store = MemoryAccountStore::new();
        let a = store
            .create(&Email::parse("a@x.com").unwrap(), "h")
            .await
            .unwrap();
        let b = store
            .create(&Email::parse("b@x.com").unwrap(), "h")
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.get_by_id(b.id).await.unwrap().unwrap().email, b.email);
    }

    #[tokio::test]
    async fn test_cart_save_replaces_document() {
        let store = MemoryCartStore::new();
        let owner = AccountId::new(1);
        assert!(store.get(owner).await.unwrap().is_none());

        let mut cart = Cart::empty(owner);
        store.save(&cart).await.unwrap();
        let saved = store.get(owner).await.unwrap().unwrap();
        assert!(saved.created_at.is_some());

        cart.items.clear();
        store.save(&cart).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
