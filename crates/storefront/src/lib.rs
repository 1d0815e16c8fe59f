//! Cartline storefront library.
//!
//! Accounts with password login, stateless session tokens carried in a
//! cookie, and one shopping cart per account. Product data is proxied from
//! an external Catalog Provider.
//!
//! [`app`] assembles the full router; the binary adds Sentry layers and
//! serves it, and tests drive it in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Credentialed CORS for the configured client origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if value != "*" => Some(value),
            _ => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::SET_COOKIE])
}

/// Build the storefront router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let rate_limiting = state.config().rate_limiting;

    let mut auth_routes = routes::auth_routes();
    let mut api_routes = routes::api_routes();

    if rate_limiting {
        if let Some(limiter) = middleware::auth_rate_limiter() {
            auth_routes = auth_routes.layer(limiter);
        }
        if let Some(limiter) = middleware::api_rate_limiter() {
            api_routes = api_routes.layer(limiter);
        }
    }

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
            account_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(routes::health_routes())
        .merge(auth_routes)
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors_layer(&state.config().allowed_origins))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
}
