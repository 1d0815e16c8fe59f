//! Session types.
//!
//! A session is never stored server-side. It exists only as a signed token
//! held by the client and is rebuilt from that token on every request.

use chrono::{DateTime, Utc};

use cartline_core::AccountId;

/// A verified session: the identity claim plus its validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Account the token was issued to.
    pub account_id: AccountId,
    /// When the token was minted.
    pub issued_at: DateTime<Utc>,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still valid at `now`.
    ///
    /// The expiry instant itself is already expired.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
