//! Integration tests for Cartline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartline-integration-tests
//! ```
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! over in-memory stores, so no database or network is needed. The Catalog
//! Provider points at a closed local port, so catalog calls always fail.
//!
//! # Test Categories
//!
//! - `storefront_flow` - Signup, login and the cart lifecycle
//! - `storefront_sessions` - Gate rejections, cookie attributes, token expiry
//! - `storefront_concurrency` - Serialized cart writes under concurrent adds

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use axum_extra::extract::cookie::Cookie;
use cartline_storefront::config::{
    CatalogConfig, DeploymentMode, HashingConfig, StorefrontConfig,
};
use cartline_storefront::db::{MemoryAccountStore, MemoryCartStore};
use cartline_storefront::middleware::SESSION_COOKIE;
use cartline_storefront::services::ManualClock;
use cartline_storefront::state::{AppState, Storage};
use chrono::Utc;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

/// Signing secret used by every test app.
pub const TEST_SECRET: &str = "integration-tests-signing-key-7f3a9c21d84e5b60";

/// Development config with fast hashing and an unreachable catalog.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::development(SecretString::from(TEST_SECRET));
    config.password_hashing = HashingConfig {
        memory_kib: 8192,
        iterations: 1,
        parallelism: 1,
    };
    config.catalog = CatalogConfig {
        base_url: url::Url::parse("http://127.0.0.1:1/").unwrap_or_else(|e| panic!("{e}")),
        ..CatalogConfig::default()
    };
    config
}

/// Production-mode variant of [`test_config`] with a cookie domain.
#[must_use]
pub fn production_config(domain: &str) -> StorefrontConfig {
    let mut config = test_config();
    config.mode = DeploymentMode::Production;
    config.cookie_domain = Some(domain.to_string());
    config
}

/// A storefront router plus handles on its stores and clock.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub accounts: Arc<MemoryAccountStore>,
    pub carts: Arc<MemoryCartStore>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// App over the default test config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// App over an explicit config.
    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let carts = Arc::new(MemoryCartStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let storage = Storage::Memory {
            accounts: accounts.clone(),
            carts: carts.clone(),
        };
        let state = AppState::with_clock(config, storage, clock.clone())
            .unwrap_or_else(|e| panic!("failed to build state: {e}"));

        Self {
            router: cartline_storefront::app(state.clone()),
            state,
            accounts,
            carts,
            clock,
        }
    }

    /// Send a request and collect the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"))
            .to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Request with an optional JSON body and session cookie.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap_or_else(|e| panic!("failed to build request: {e}"));

        self.send(request).await
    }

    /// Sign up and return the session token.
    pub async fn signup(&self, email: &str, secret: &str) -> String {
        let response = self
            .call(
                Method::POST,
                "/signup",
                Some(serde_json::json!({ "email": email, "secret": secret })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response
            .session_cookie()
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_else(|| panic!("signup did not set a session cookie"))
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `Set-Cookie` for the session cookie, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .find(|cookie| cookie.name() == SESSION_COOKIE)
    }

    /// The `msg` field of the envelope.
    #[must_use]
    pub fn msg(&self) -> Option<&str> {
        self.body.get("msg").and_then(Value::as_str)
    }

    /// The `cart.items` array of a cart response.
    #[must_use]
    pub fn cart_items(&self) -> &[Value] {
        self.body
            .pointer("/cart/items")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }
}
