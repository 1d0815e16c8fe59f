//! Session cookie transport.
//!
//! The session token travels in an httpOnly cookie named [`SESSION_COOKIE`].
//! Its attributes depend on the deployment mode:
//!
//! | Mode        | `Secure` | `SameSite` | `Domain`        |
//! |-------------|----------|------------|-----------------|
//! | development | no       | `Lax`      | unset           |
//! | production  | yes      | `None`     | configured apex |
//!
//! Setting and clearing go through the same builder, so a clearing cookie
//! always carries the attributes the session cookie was set with. Browsers
//! ignore a clear whose attributes differ.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::{DeploymentMode, StorefrontConfig};
use crate::services::token::SESSION_TTL_SECS;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Builds session cookies for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookies {
    mode: DeploymentMode,
    domain: Option<String>,
}

impl SessionCookies {
    /// Create a cookie builder for the given mode.
    ///
    /// `domain` is only applied in production.
    #[must_use]
    pub fn new(mode: DeploymentMode, domain: Option<String>) -> Self {
        let domain = match mode {
            DeploymentMode::Production => domain,
            DeploymentMode::Development => None,
        };
        Self { mode, domain }
    }

    /// Cookie settings for a loaded configuration.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self::new(config.mode, config.cookie_domain.clone())
    }

    fn build(&self, value: String) -> Cookie<'static> {
        let (secure, same_site) = match self.mode {
            DeploymentMode::Development => (false, SameSite::Lax),
            DeploymentMode::Production => (true, SameSite::None),
        };

        let mut builder = Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .secure(secure)
            .same_site(same_site)
            .path("/")
            .max_age(time::Duration::seconds(SESSION_TTL_SECS));

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }

    /// The cookie that carries a freshly issued token.
    #[must_use]
    pub fn session(&self, token: String) -> Cookie<'static> {
        self.build(token)
    }

    /// The cookie that deletes the session cookie.
    #[must_use]
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = self.build(String::new());
        cookie.make_removal();
        cookie
    }

    /// Add the session cookie to a jar.
    #[must_use]
    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        jar.add(self.session(token))
    }

    /// Add the clearing cookie to a jar.
    ///
    /// `CookieJar::remove` only keeps name, path and domain; adding a full
    /// removal cookie keeps `Secure` and `SameSite` as well.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal())
    }
}

/// Read the session token from a request's cookies.
///
/// An empty cookie counts as absent.
#[must_use]
pub fn token_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(cookie: &Cookie<'_>) -> (Option<bool>, Option<bool>, Option<SameSite>, Option<String>, Option<String>) {
        (
            cookie.http_only(),
            cookie.secure(),
            cookie.same_site(),
            cookie.domain().map(String::from),
            cookie.path().map(String::from),
        )
    }

    #[test]
    fn test_development_attributes() {
        let cookies = SessionCookies::new(DeploymentMode::Development, Some("shop.test".into()));
        let cookie = cookies.session("abc".to_string());

        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.domain(), None);
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_production_attributes() {
        let cookies = SessionCookies::new(DeploymentMode::Production, Some("shop.test".into()));
        let cookie = cookies.session("abc".to_string());

        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.domain(), Some("shop.test"));
    }

    #[test]
    fn test_max_age_matches_token_lifetime() {
        let cookie = SessionCookies::new(DeploymentMode::Development, None).session("abc".into());
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::milliseconds(3_600_000))
        );
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(SESSION_TTL_SECS));
    }

    #[test]
    fn test_removal_uses_same_attributes() {
        for mode in [DeploymentMode::Development, DeploymentMode::Production] {
            let cookies = SessionCookies::new(mode, Some("shop.test".into()));
            let set = cookies.session("abc".to_string());
            let cleared = cookies.removal();

            assert_eq!(attributes(&set), attributes(&cleared), "mode {mode:?}");
            assert_eq!(cleared.value(), "");
            assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
        }
    }

    #[test]
    fn test_token_from_jar() {
        let jar = CookieJar::new();
        assert_eq!(token_from_jar(&jar), None);

        let jar = jar.add(Cookie::new(SESSION_COOKIE, ""));
        assert_eq!(token_from_jar(&jar), None);

        let jar = jar.add(Cookie::new(SESSION_COOKIE, "abc"));
        assert_eq!(token_from_jar(&jar).as_deref(), Some("abc"));
    }
}
