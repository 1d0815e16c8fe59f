//! Authentication extractor.
//!
//! [`RequireSession`] guards every cart route and the session check endpoint.
//! It looks for a token in the session cookie, then in an
//! `Authorization: Bearer` header, and verifies it. Any failure answers 401
//! and clears the session cookie so the client stops sending a dead token.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use thiserror::Error;

use crate::middleware::session::{SessionCookies, token_from_jar};
use crate::models::Session;
use crate::response::ApiResponse;
use crate::services::token::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(session): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, account {}!", session.account_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireSession(pub Session);

/// Why a request was refused a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionFailure {
    /// Neither the cookie nor the header carried a token.
    #[error("no session token")]
    Missing,
    /// The token failed verification.
    #[error("invalid session token")]
    Invalid,
    /// The token is past its expiry.
    #[error("expired session token")]
    Expired,
    /// The token names an account that no longer exists.
    #[error("session account not found")]
    UnknownAccount,
}

impl From<TokenError> for SessionFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Expired,
            TokenError::Invalid | TokenError::Signing(_) => Self::Invalid,
        }
    }
}

/// Rejection for requests without a usable session: 401 plus a clearing cookie.
#[derive(Debug, Clone, Error)]
#[error("{failure}")]
pub struct AuthRejection {
    failure: SessionFailure,
    clear: Cookie<'static>,
}

impl AuthRejection {
    /// Build a rejection that clears the cookie set by `cookies`.
    #[must_use]
    pub fn new(failure: SessionFailure, cookies: &SessionCookies) -> Self {
        Self {
            failure,
            clear: cookies.removal(),
        }
    }

    /// What went wrong.
    #[must_use]
    pub const fn failure(&self) -> SessionFailure {
        self.failure
    }

    /// Message shown to the client.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.failure {
            SessionFailure::Missing => "Authentication required",
            SessionFailure::Invalid | SessionFailure::Expired => "Invalid or expired token",
            SessionFailure::UnknownAccount => "User not found",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = ApiResponse::failure(self.message());
        let jar = CookieJar::new().add(self.clear);

        (StatusCode::UNAUTHORIZED, jar, Json(body)).into_response()
    }
}

/// Read a bearer token from the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let reject = |failure: SessionFailure| {
            tracing::info!(reason = %failure, path = %parts.uri.path(), "Session rejected");
            AuthRejection::new(failure, state.cookies())
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let token = token_from_jar(&jar)
            .or_else(|| bearer_token(parts))
            .ok_or_else(|| reject(SessionFailure::Missing))?;

        let session = state
            .tokens()
            .verify(&token)
            .map_err(|e| reject(e.into()))?;

        tracing::Span::current().record("account_id", tracing::field::display(session.account_id));

        Ok(Self(session))
    }
}
