//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Status mapping:
//!
//! | Kind                                   | Status |
//! |----------------------------------------|--------|
//! | validation, duplicate email, wrong password | 400 |
//! | missing/invalid/expired session        | 401    |
//! | account, cart or item absent           | 404    |
//! | store, catalog or other internal error | 500    |
//!
//! Internal errors are logged with detail and answered with a fixed message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use cartline_core::CartError;

use crate::middleware::auth::AuthRejection;
use crate::response::ApiResponse;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Signup or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A cart merge rule rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The request carried no usable session.
    #[error("Session rejected: {0}")]
    Session(#[from] AuthRejection),

    /// A store or external service failed; `msg` is what the client sees.
    #[error("{msg}: {source}")]
    Upstream {
        msg: &'static str,
        #[source]
        source: BoxError,
    },

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a dependency failure with the message shown to clients.
    pub fn upstream(msg: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Upstream {
            msg,
            source: source.into(),
        }
    }

    /// Map a cart service failure, using `msg` if the store failed.
    #[must_use]
    pub fn cart(err: CartServiceError, msg: &'static str) -> Self {
        match err {
            CartServiceError::Cart(e) => Self::Cart(e),
            CartServiceError::Repository(e) => Self::upstream(msg, e),
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Upstream { .. } | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_)
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => match err {
                AuthError::MissingCredentials
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::AccountAlreadyExists
                | AuthError::IncorrectPassword => StatusCode::BAD_REQUEST,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                CartError::CartNotFound | CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            },
            Self::Session(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to clients.
    fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::MissingCredentials => "Email and password are required".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::AccountAlreadyExists => "Email already registered".to_string(),
                AuthError::AccountNotFound => "Account not found".to_string(),
                AuthError::IncorrectPassword => "Incorrect password".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => "Invalid quantity value".to_string(),
                CartError::CartNotFound => "Cart not found".to_string(),
                CartError::ItemNotFound(_) => "Item not found in cart".to_string(),
            },
            Self::Session(rejection) => rejection.message().to_string(),
            Self::Upstream { msg, .. } => (*msg).to_string(),
            Self::RateLimited => "Too many requests".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The rejection carries the clearing cookie.
        if let Self::Session(rejection) = self {
            return rejection.into_response();
        }

        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ApiResponse::failure(self.client_message());

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with accounts.
pub fn set_sentry_user(account_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the account.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use cartline_core::ProductId;

    use super::*;
    use crate::db::RepositoryError;

    async fn body(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Validation error: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Auth(AuthError::AccountAlreadyExists)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::IncorrectPassword)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::AccountNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::ItemNotFound(ProductId::new(1)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::InvalidQuantity(0))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_upstream_errors_hide_detail() {
        let err = AppError::cart(
            CartServiceError::Repository(RepositoryError::DataCorruption(
                "items column is not an array".to_string(),
            )),
            "Error fetching cart",
        );
        let (status, json) = body(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "msg": "Error fetching cart" })
        );
    }

    #[tokio::test]
    async fn test_internal_auth_errors_hide_detail() {
        let err = AppError::Auth(AuthError::Repository(RepositoryError::DataCorruption(
            "bad email".to_string(),
        )));
        let (status, json) = body(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["msg"], "Internal server error");
    }
}
