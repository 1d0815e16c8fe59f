//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (database reachable)
//!
//! # Accounts (rate limited)
//! POST   /signup                 - Create account, set session cookie
//! POST   /login                  - Log in, set session cookie
//! POST   /logout                 - Clear session cookie
//!
//! # API
//! GET    /api/auth/verify        - Current account (requires session)
//! GET    /api/cart               - View cart (requires session)
//! POST   /api/cart               - Add product (requires session)
//! PUT    /api/cart/{productId}   - Set quantity (requires session)
//! DELETE /api/cart/{productId}   - Remove product (requires session)
//! GET    /api/products           - Catalog listing (?category=, ?limit=)
//! GET    /api/products/{id}      - Catalog product
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Signup, login and logout.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Session check, cart and catalog routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/cart", get(cart::view).post(cart::add))
        .route(
            "/cart/{product_id}",
            put(cart::update_quantity).delete(cart::remove),
        )
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::detail))
}

/// Liveness and readiness probes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
