//! Storefront configuration loaded from environment variables.
//!
//! The configuration is read exactly once, in `main`, and handed to
//! [`AppState`](crate::state::AppState). Nothing reads the environment after
//! startup.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_TOKEN_SECRET` - Session token signing secret (min 32 chars, high entropy)
//!
//! ## Required in production
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_COOKIE_DOMAIN` - Cookie domain shared with the client (e.g. `.example.com`)
//!
//! ## Optional
//! - `STOREFRONT_MODE` - `development` (default) or `production`
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ALLOWED_ORIGINS` - Comma-separated CORS origins (default: `http://localhost:3000`)
//! - `STOREFRONT_RATE_LIMIT` - Enable rate limiting (default: true)
//! - `CATALOG_BASE_URL` - Catalog Provider base URL (default: `https://dummyjson.com`)
//! - `CART_CONSISTENCY` - `serialized` (default) or `last-write-wins`
//! - `PASSWORD_HASH_MEMORY_KIB` / `PASSWORD_HASH_ITERATIONS` / `PASSWORD_HASH_PARALLELISM`
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where the storefront is deployed. Selects the session cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Local development: plain HTTP, same-site client.
    #[default]
    Development,
    /// Public deployment: HTTPS, client served from another origin.
    Production,
}

impl DeploymentMode {
    /// Name used for logs and Sentry environments.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown deployment mode '{other}'")),
        }
    }
}

/// How concurrent mutations of the same cart are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartConsistency {
    /// Mutations for one account run one at a time.
    #[default]
    Serialized,
    /// Unsynchronized read-modify-write; the last writer's document wins.
    LastWriteWins,
}

impl FromStr for CartConsistency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" => Ok(Self::Serialized),
            "last-write-wins" | "lww" => Ok(Self::LastWriteWins),
            other => Err(format!("unknown cart consistency '{other}'")),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl HashingConfig {
    /// Lowest memory cost accepted from the environment.
    pub const MIN_MEMORY_KIB: u32 = 8 * 1024;
}

impl Default for HashingConfig {
    /// OWASP-recommended Argon2id baseline (19 MiB, 2 passes).
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Catalog Provider client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the provider API.
    pub base_url: Url,
    /// How long provider responses are cached.
    pub cache_ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_CATALOG_URL).unwrap_or_else(|_| unreachable!()),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Deployment mode (cookie attributes, strictness of validation)
    pub mode: DeploymentMode,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` connection URL; `None` runs with in-memory stores
    pub database_url: Option<SecretString>,
    /// Session token signing secret
    pub token_secret: SecretString,
    /// Session cookie domain (production only)
    pub cookie_domain: Option<String>,
    /// Origins allowed to make credentialed CORS requests
    pub allowed_origins: Vec<String>,
    /// Catalog Provider configuration
    pub catalog: CatalogConfig,
    /// Password hashing cost
    pub password_hashing: HashingConfig,
    /// Cart mutation ordering
    pub cart_consistency: CartConsistency,
    /// Whether auth/API rate limiting is enabled
    pub rate_limiting: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let mode = env.parse_or("STOREFRONT_MODE", DeploymentMode::Development)?;
        let host = env.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("STOREFRONT_PORT", 3000_u16)?;

        let token_secret = env.required("STOREFRONT_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "STOREFRONT_TOKEN_SECRET")?;
        let token_secret = SecretString::from(token_secret);

        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);

        let cookie_domain = match mode {
            DeploymentMode::Production => Some(env.required("STOREFRONT_COOKIE_DOMAIN")?),
            DeploymentMode::Development => None,
        };

        if mode == DeploymentMode::Production && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "STOREFRONT_DATABASE_URL".to_string(),
            ));
        }

        let allowed_origins = env
            .optional("STOREFRONT_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        validate_origins(&allowed_origins)?;

        let base_url = env
            .optional("CATALOG_BASE_URL")
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_BASE_URL".to_string(), e.to_string())
        })?;

        let defaults = HashingConfig::default();
        let password_hashing = HashingConfig {
            memory_kib: env.parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env.parse_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: env.parse_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };
        validate_hashing(&password_hashing)?;

        Ok(Self {
            mode,
            host,
            port,
            database_url,
            token_secret,
            cookie_domain,
            allowed_origins,
            catalog: CatalogConfig {
                base_url,
                ..CatalogConfig::default()
            },
            password_hashing,
            cart_consistency: env.parse_or("CART_CONSISTENCY", CartConsistency::Serialized)?,
            rate_limiting: env.parse_or("STOREFRONT_RATE_LIMIT", true)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }

    /// Development configuration with in-memory stores.
    ///
    /// Used by tests; the secret is taken as given.
    #[must_use]
    pub fn development(token_secret: SecretString) -> Self {
        Self {
            mode: DeploymentMode::Development,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            database_url: None,
            token_secret,
            cookie_domain: None,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            catalog: CatalogConfig::default(),
            password_hashing: HashingConfig::default(),
            cart_consistency: CartConsistency::Serialized,
            rate_limiting: false,
            sentry_dsn: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Credentialed CORS needs explicit origins; a wildcard cannot be listed.
fn validate_origins(origins: &[String]) -> Result<(), ConfigError> {
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_ALLOWED_ORIGINS".to_string(),
            "wildcard origin is not allowed with credentialed CORS".to_string(),
        ));
    }
    Ok(())
}

/// Reject hashing parameters too cheap to resist offline guessing.
fn validate_hashing(config: &HashingConfig) -> Result<(), ConfigError> {
    if config.memory_kib < HashingConfig::MIN_MEMORY_KIB {
        return Err(ConfigError::InvalidEnvVar(
            "PASSWORD_HASH_MEMORY_KIB".to_string(),
            format!("must be at least {}", HashingConfig::MIN_MEMORY_KIB),
        ));
    }
    if config.iterations == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "PASSWORD_HASH_ITERATIONS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    if config.parallelism == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "PASSWORD_HASH_PARALLELISM".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Validate length, placeholder patterns and entropy of the signing secret.
fn validate_token_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                secret.len()
            ),
        ));
    }
    validate_secret_strength(secret, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Expose the raw secret bytes for key construction.
pub(crate) fn secret_bytes(secret: &SecretString) -> &[u8] {
    secret.expose_secret().as_bytes()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_token_secret_fails_startup() {
        let err = StorefrontConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STOREFRONT_TOKEN_SECRET"));
    }

    #[test]
    fn test_weak_token_secrets_rejected() {
        for weak in [
            "Mouli222",
            "your-jwt-secret-key-goes-here-1234567",
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        ] {
            let result =
                StorefrontConfig::from_vars(vars(&[("STOREFRONT_TOKEN_SECRET", weak)]));
            assert!(
                matches!(result, Err(ConfigError::InsecureSecret(_, _))),
                "accepted weak secret {weak}"
            );
        }
    }

    #[test]
    fn test_development_defaults() {
        let config =
            StorefrontConfig::from_vars(vars(&[("STOREFRONT_TOKEN_SECRET", STRONG_SECRET)]))
                .unwrap();

        assert_eq!(config.mode, DeploymentMode::Development);
        assert!(config.database_url.is_none());
        assert!(config.cookie_domain.is_none());
        assert_eq!(config.cart_consistency, CartConsistency::Serialized);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.catalog.base_url.as_str(), "https://dummyjson.com/");
        assert_eq!(config.password_hashing, HashingConfig::default());
        assert_eq!(config.socket_addr().port(), 3000);
    }

    #[test]
    fn test_production_requires_database_and_cookie_domain() {
        let missing_domain = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            ("STOREFRONT_MODE", "production"),
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/cartline"),
        ]));
        assert!(matches!(missing_domain, Err(ConfigError::MissingEnvVar(ref k)) if k == "STOREFRONT_COOKIE_DOMAIN"));

        let missing_db = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            ("STOREFRONT_MODE", "production"),
            ("STOREFRONT_COOKIE_DOMAIN", ".shop.test"),
        ]));
        assert!(matches!(missing_db, Err(ConfigError::MissingEnvVar(ref k)) if k == "STOREFRONT_DATABASE_URL"));

        let ok = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            ("STOREFRONT_MODE", "production"),
            ("STOREFRONT_COOKIE_DOMAIN", ".shop.test"),
            ("DATABASE_URL", "postgres://localhost/cartline"),
        ]))
        .unwrap();
        assert_eq!(ok.cookie_domain.as_deref(), Some(".shop.test"));
    }

    #[test]
    fn test_origins_and_consistency_parsing() {
        let config = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            (
                "STOREFRONT_ALLOWED_ORIGINS",
                "https://shop.test, http://localhost:5173 ,",
            ),
            ("CART_CONSISTENCY", "last-write-wins"),
        ]))
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["https://shop.test", "http://localhost:5173"]
        );
        assert_eq!(config.cart_consistency, CartConsistency::LastWriteWins);
    }

    #[test]
    fn test_wildcard_origin_rejected() {
        for origins in ["*", "https://shop.test, *"] {
            let result = StorefrontConfig::from_vars(vars(&[
                ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
                ("STOREFRONT_ALLOWED_ORIGINS", origins),
            ]));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "STOREFRONT_ALLOWED_ORIGINS")
            );
        }
    }

    #[test]
    fn test_cheap_hashing_rejected() {
        let result = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            ("PASSWORD_HASH_MEMORY_KIB", "64"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "PASSWORD_HASH_MEMORY_KIB"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_TOKEN_SECRET", STRONG_SECRET),
            ("STOREFRONT_PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_debug_redacts_token_secret() {
        let config = StorefrontConfig::development(SecretString::from(STRONG_SECRET));
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains(STRONG_SECRET));
    }
}
