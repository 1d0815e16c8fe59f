//! Cart route handlers.
//!
//! All cart routes require a session; the cart is always the session
//! account's own. Responses carry the whole cart as `{"success", "cart"}`.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartline_core::{Cart, NewCartItem, Price, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireSession;
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

/// `{ "cart": {...} }`
#[derive(Debug, Serialize)]
pub struct CartPayload {
    pub cart: Cart,
}

type CartResponse = Json<ApiResponse<CartPayload>>;

fn cart_response(cart: Cart) -> CartResponse {
    Json(ApiResponse::ok(CartPayload { cart }))
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl AddToCartRequest {
    /// A positive product id, a non-empty title and a positive price are required.
    fn into_item(self) -> Option<NewCartItem> {
        let product_id = self.product_id.filter(|id| id.as_i64() > 0)?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let price = self.price.filter(Price::is_positive)?;

        Some(NewCartItem {
            product_id,
            title,
            price,
            thumbnail: self.thumbnail.filter(|t| !t.is_empty()),
        })
    }
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid product id".to_string()))
}

/// Show the cart, or an empty one if nothing was ever added.
#[instrument(skip(state, session), fields(account_id = %session.account_id))]
pub async fn view(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Result<CartResponse> {
    let cart = state
        .carts()
        .view(session.account_id)
        .await
        .map_err(|e| AppError::cart(e, "Error fetching cart"))?;

    Ok(cart_response(cart))
}

/// Add one unit of a product.
#[instrument(skip(state, session, body), fields(account_id = %session.account_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<CartResponse> {
    let item = body
        .into_item()
        .ok_or_else(|| AppError::Validation("Missing required product fields".to_string()))?;

    let cart = state
        .carts()
        .add(session.account_id, item)
        .await
        .map_err(|e| AppError::cart(e, "Error adding to cart"))?;

    Ok(cart_response(cart))
}

/// Set a line's quantity.
#[instrument(skip(state, session, body), fields(account_id = %session.account_id))]
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<UpdateQuantityRequest>,
) -> Result<CartResponse> {
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::Validation("Invalid quantity value".to_string()))?;
    let product_id = parse_product_id(&product_id)?;

    let cart = state
        .carts()
        .set_quantity(session.account_id, product_id, quantity)
        .await
        .map_err(|e| AppError::cart(e, "Error updating cart quantity"))?;

    Ok(cart_response(cart))
}

/// Remove a product's line.
#[instrument(skip(state, session), fields(account_id = %session.account_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(product_id): Path<String>,
) -> Result<CartResponse> {
    let product_id = parse_product_id(&product_id)?;

    let cart = state
        .carts()
        .remove(session.account_id, product_id)
        .await
        .map_err(|e| AppError::cart(e, "Error removing item from cart"))?;

    Ok(cart_response(cart))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> AddToCartRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_add_request_requires_fields() {
        assert!(
            request(serde_json::json!({ "productId": 7, "title": "Phone", "price": 200 }))
                .into_item()
                .is_some()
        );
        assert!(
            request(serde_json::json!({ "title": "Phone", "price": 200 }))
                .into_item()
                .is_none()
        );
        assert!(
            request(serde_json::json!({ "productId": 0, "title": "Phone", "price": 200 }))
                .into_item()
                .is_none()
        );
        assert!(
            request(serde_json::json!({ "productId": -4, "title": "Phone", "price": 200 }))
                .into_item()
                .is_none()
        );
        assert!(
            request(serde_json::json!({ "productId": 7, "price": 200 }))
                .into_item()
                .is_none()
        );
        assert!(
            request(serde_json::json!({ "productId": 7, "title": "Phone", "price": 0 }))
                .into_item()
                .is_none()
        );
        // A negative price is not a price at all.
        assert!(
            serde_json::from_value::<AddToCartRequest>(
                serde_json::json!({ "productId": 7, "title": "Phone", "price": -3 })
            )
            .is_err()
        );
    }

    #[test]
    fn test_thumbnail_is_optional() {
        let item = request(serde_json::json!({
            "productId": 7,
            "title": "Phone",
            "price": 19.99,
            "thumbnail": "https://cdn.example/7.png"
        }))
        .into_item()
        .unwrap();

        assert_eq!(item.product_id, ProductId::new(7));
        assert_eq!(item.thumbnail.as_deref(), Some("https://cdn.example/7.png"));
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("7").unwrap(), ProductId::new(7));
        assert!(parse_product_id("seven").is_err());
    }
}
