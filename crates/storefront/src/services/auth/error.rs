//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::password::PasswordError;
use crate::services::token::TokenError;

/// Errors that can occur during signup and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password was not supplied.
    #[error("email and password are required")]
    MissingCredentials,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] cartline_core::EmailError),

    /// Password too short.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// An account with this email already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// No account is registered under this email.
    #[error("account not found")]
    AccountNotFound,

    /// The account exists but the password does not match.
    #[error("incorrect password")]
    IncorrectPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    /// Session token could not be minted.
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}
