//! Authentication gate, session cookie attributes and token expiry.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use cartline_core::AccountId;
use cartline_integration_tests::{TestApp, TestResponse, production_config};
use chrono::TimeDelta;
use serde_json::json;

fn cleared(response: &TestResponse) -> Cookie<'static> {
    let cookie = response
        .session_cookie()
        .unwrap_or_else(|| panic!("expected a clearing cookie"));
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    cookie
}

#[tokio::test]
async fn test_protected_routes_reject_without_touching_store() {
    let app = TestApp::new();

    let requests = [
        (Method::GET, "/api/cart", None),
        (
            Method::POST,
            "/api/cart",
            Some(json!({ "productId": 7, "title": "Phone", "price": 200 })),
        ),
        (Method::PUT, "/api/cart/7", Some(json!({ "quantity": 2 }))),
        (Method::DELETE, "/api/cart/7", None),
        (Method::GET, "/api/auth/verify", None),
    ];

    for (method, uri, body) in requests {
        let response = app.call(method.clone(), uri, body, None).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response.body["success"], false);
        assert_eq!(response.msg(), Some("Authentication required"));
        cleared(&response);
    }

    assert!(app.carts.is_empty().await);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new();
    let token = app.signup("t@x.com", "secret1").await;

    // Swap one character inside the signature.
    let at = token.len() - 10;
    let swapped = if token.as_bytes()[at] == b'A' { "B" } else { "A" };
    let mut tampered = token.clone();
    tampered.replace_range(at..=at, swapped);

    for bad in [tampered.as_str(), "garbage", "a.b.c"] {
        let response = app.call(Method::GET, "/api/cart", None, Some(bad)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.msg(), Some("Invalid or expired token"));
        cleared(&response);
    }
}

#[tokio::test]
async fn test_token_expires_after_one_hour() {
    let app = TestApp::new();
    let token = app.signup("e@x.com", "secret1").await;

    app.clock.advance(TimeDelta::minutes(59));
    let fresh = app
        .call(Method::GET, "/api/auth/verify", None, Some(&token))
        .await;
    assert_eq!(fresh.status, StatusCode::OK);

    app.clock.advance(TimeDelta::minutes(1));
    let expired = app
        .call(Method::GET, "/api/auth/verify", None, Some(&token))
        .await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired.msg(), Some("Invalid or expired token"));
    cleared(&expired);
}

#[tokio::test]
async fn test_verify_unknown_account() {
    let app = TestApp::new();
    let token = app
        .state
        .tokens()
        .issue(AccountId::new(9999))
        .unwrap_or_else(|e| panic!("{e}"));

    let response = app
        .call(Method::GET, "/api/auth/verify", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.msg(), Some("User not found"));
    cleared(&response);
}

#[tokio::test]
async fn test_bearer_header_fallback() {
    let app = TestApp::new();
    let token = app.signup("h@x.com", "secret1").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/cart")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("{e}"));
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.cart_items().is_empty());
}

#[tokio::test]
async fn test_development_cookie_attributes() {
    let app = TestApp::new();

    let signup = app
        .call(
            Method::POST,
            "/signup",
            Some(json!({ "email": "dev@x.com", "secret": "secret1" })),
            None,
        )
        .await;
    let set = signup
        .session_cookie()
        .unwrap_or_else(|| panic!("no session cookie"));

    assert_eq!(set.http_only(), Some(true));
    assert_ne!(set.secure(), Some(true));
    assert_eq!(set.same_site(), Some(SameSite::Lax));
    assert_eq!(set.domain(), None);
    assert_eq!(set.path(), Some("/"));
    assert_eq!(
        set.max_age(),
        Some(time::Duration::seconds(3600))
    );

    let logout = app.call(Method::POST, "/logout", None, None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.msg(), Some("Logged out successfully"));
    assert_same_attributes(&set, &cleared(&logout));
}

#[tokio::test]
async fn test_production_cookie_attributes() {
    let app = TestApp::with_config(production_config("shop.example"));

    let signup = app
        .call(
            Method::POST,
            "/signup",
            Some(json!({ "email": "prod@x.com", "secret": "secret1" })),
            None,
        )
        .await;
    let set = signup
        .session_cookie()
        .unwrap_or_else(|| panic!("no session cookie"));

    assert_eq!(set.secure(), Some(true));
    assert_eq!(set.same_site(), Some(SameSite::None));
    assert_eq!(set.domain(), Some("shop.example"));

    let logout = app.call(Method::POST, "/logout", None, None).await;
    assert_same_attributes(&set, &cleared(&logout));

    // The gate clears with the same attributes.
    let rejected = app.call(Method::GET, "/api/cart", None, None).await;
    assert_same_attributes(&set, &cleared(&rejected));
}

fn assert_same_attributes(set: &Cookie<'_>, clear: &Cookie<'_>) {
    assert_eq!(set.name(), clear.name());
    assert_eq!(set.path(), clear.path());
    assert_eq!(set.domain(), clear.domain());
    assert_eq!(set.secure(), clear.secure());
    assert_eq!(set.same_site(), clear.same_site());
    assert_eq!(set.http_only(), clear.http_only());
}
