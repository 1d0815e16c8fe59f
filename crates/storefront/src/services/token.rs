//! Session token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying the account identity (`sub`), the
//! issue time (`iat`) and an expiry (`exp`) exactly [`SESSION_TTL_SECS`]
//! after issue. Nothing is stored server-side; there is no revocation.
//!
//! Expiry is checked against an injected [`Clock`] instead of the library's
//! wall-clock check so that tests can move time forward.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartline_core::AccountId;

use crate::config::secret_bytes;
use crate::models::Session;

/// Lifetime of a session token, and of the cookie carrying it.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Token verification and signing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, malformed token or claims.
    #[error("invalid token")]
    Invalid,

    /// Signature is valid but the token is past its expiry.
    #[error("token expired")]
    Expired,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Start the clock at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session tokens with a process-wide signing key.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service using the system clock.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    /// Create a token service with an explicit clock.
    #[must_use]
    pub fn with_clock(secret: &SecretString, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret_bytes(secret)),
            decoding: DecodingKey::from_secret(secret_bytes(secret)),
            validation,
            clock,
        }
    }

    /// Current time according to this service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Mint a token for `account_id`, valid for one hour from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be encoded.
    pub fn issue(&self, account_id: AccountId) -> Result<String, TokenError> {
        let iat = self.clock.now().timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and rebuild the session it describes.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for any signature, algorithm or claim
    /// problem and `TokenError::Expired` once the expiry has been reached.
    pub fn verify(&self, token: &str) -> Result<Session, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            TokenError::Invalid
        })?;
        let claims = data.claims;

        let account_id = claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| TokenError::Invalid)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Invalid)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Invalid)?;

        let session = Session {
            account_id,
            issued_at,
            expires_at,
        };

        if !session.is_valid_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(session)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn service() -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = TokenService::with_clock(&SecretString::from(SECRET), clock.clone());
        (service, clock)
    }

    #[test]
    fn test_issue_then_verify_round_trips() {
        let (tokens, _) = service();
        let token = tokens.issue(AccountId::new(42)).unwrap();

        let session = tokens.verify(&token).unwrap();
        assert_eq!(session.account_id, AccountId::new(42));
        assert_eq!(
            session.expires_at - session.issued_at,
            TimeDelta::seconds(SESSION_TTL_SECS)
        );
    }

    #[test]
    fn test_expires_after_one_hour() {
        let (tokens, clock) = service();
        let token = tokens.issue(AccountId::new(1)).unwrap();

        clock.advance(TimeDelta::minutes(59));
        assert!(tokens.verify(&token).is_ok());

        clock.advance(TimeDelta::minutes(1));
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let (tokens, _) = service();
        let token = tokens.issue(AccountId::new(1)).unwrap();

        let other = tokens.issue(AccountId::new(2)).unwrap();

        // Payload of account 2 under the signature of account 1.
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = other.split('.').nth(1).unwrap();
        let tampered = parts.join(".");

        assert_eq!(tokens.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let (tokens, _) = service();
        let other = TokenService::new(&SecretString::from("Zq8#Lw2!Xe5$Rt7&Yu1*Io4^Pa6@Sd9%"));
        let token = other.issue(AccountId::new(1)).unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_algorithm_mismatch_is_invalid() {
        let (tokens, clock) = service();
        let iat = clock.now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let (tokens, _) = service();
        assert_eq!(tokens.verify(""), Err(TokenError::Invalid));
        assert_eq!(tokens.verify("not.a.jwt"), Err(TokenError::Invalid));
    }
}
