//! Account route handlers.
//!
//! Signup and login set the session cookie; logout clears it with the same
//! attributes. None of these require a session. `/api/auth/verify` does.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{AuthRejection, RequireSession, SessionFailure};
use crate::models::AccountSummary;
use crate::response::{ApiJson, ApiResponse, NoPayload};
use crate::services::SignedIn;
use crate::state::AppState;

/// Signup/login request body.
///
/// Accepts `Email`/`Password` as sent by older clients; `secret` is an
/// alias for the password.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Password", alias = "secret")]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `{ "user": { "email", "id" } }`
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: AccountSummary,
}

type UserResponse = (StatusCode, CookieJar, Json<ApiResponse<UserPayload>>);

fn signed_in(
    state: &AppState,
    jar: CookieJar,
    status: StatusCode,
    msg: &str,
    SignedIn { account, token }: SignedIn,
) -> UserResponse {
    set_sentry_user(&account.id);

    let jar = state.cookies().set(jar, token);
    let body = ApiResponse::ok_with(msg, UserPayload {
        user: account.summary(),
    });

    (status, jar, Json(body))
}

/// Create an account and start a session.
#[instrument(skip(state, jar, body))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<UserResponse> {
    let signed = state
        .auth()
        .signup(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(signed_in(
        &state,
        jar,
        StatusCode::CREATED,
        "Account created successfully!",
        signed,
    ))
}

/// Check a password and start a session.
#[instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<UserResponse> {
    let signed = state
        .auth()
        .login(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(signed_in(
        &state,
        jar,
        StatusCode::OK,
        "Logged in successfully!",
        signed,
    ))
}

/// Return the account behind the current session.
#[instrument(skip(state, session), fields(account_id = %session.account_id))]
pub async fn verify(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Result<Json<ApiResponse<UserPayload>>> {
    let account = state
        .auth()
        .account_for_session(&session)
        .await?
        .ok_or_else(|| AuthRejection::new(SessionFailure::UnknownAccount, state.cookies()))?;

    Ok(Json(ApiResponse::ok(UserPayload {
        user: account.summary(),
    })))
}

/// End the session by clearing the cookie.
///
/// Tokens are stateless; a copy of the token kept elsewhere stays valid
/// until it expires.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<NoPayload>>) {
    clear_sentry_user();

    (
        state.cookies().clear(jar),
        Json(ApiResponse::message("Logged out successfully")),
    )
}
