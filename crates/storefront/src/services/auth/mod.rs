//! Authentication service.
//!
//! Password signup and login over the credential store. Both return a freshly
//! issued session token alongside the account; binding that token to the
//! response is the transport's job.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use cartline_core::Email;

use crate::db::{AccountStore, RepositoryError};
use crate::models::{Account, Session};
use crate::services::password::PasswordHasher;
use crate::services::token::TokenService;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// An authenticated account and the token that proves it.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub account: Account,
    pub token: String,
}

/// Authentication service.
///
/// Handles account registration, login, and resolving sessions to accounts.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
        }
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either field is empty.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::AccountAlreadyExists` if the email is already registered.
    pub async fn signup(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        require_credentials(email, password)?;

        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = self.hasher.hash(password)?;

        let account = self
            .accounts
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(account_id = %account.id, "Account created");

        let token = self.tokens.issue(account.id)?;
        Ok(SignedIn { account, token })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either field is empty.
    /// Returns `AuthError::AccountNotFound` if no account has this exact email.
    /// Returns `AuthError::IncorrectPassword` if the password does not verify.
    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        require_credentials(email, password)?;

        // A malformed email can never have been registered.
        let email = Email::parse(email).map_err(|_| AuthError::AccountNotFound)?;

        let (account, password_hash) = self
            .accounts
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !self.hasher.verify(password, &password_hash) {
            tracing::warn!(account_id = %account.id, "Login failed: incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        tracing::info!(account_id = %account.id, "Account logged in");

        let token = self.tokens.issue(account.id)?;
        Ok(SignedIn { account, token })
    }

    /// Resolve a verified session to its account.
    ///
    /// Returns `None` when the account named by the token no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn account_for_session(
        &self,
        session: &Session,
    ) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.get_by_id(session.account_id).await?)
    }
}

fn require_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
