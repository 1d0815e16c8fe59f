//! Catalog proxy handlers.
//!
//! Open to anonymous clients. Provider JSON is returned as-is; provider
//! failures become a 500 with a fixed message.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::catalog::{DEFAULT_LIST_LIMIT, ProductListing};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// A category wins over a limit; an unparsable limit falls back to the default.
    fn listing(self) -> ProductListing {
        match self.category.filter(|c| !c.trim().is_empty()) {
            Some(category) => ProductListing::Category(category),
            None => ProductListing::Limit(
                self.limit
                    .and_then(|l| l.trim().parse().ok())
                    .unwrap_or(DEFAULT_LIST_LIMIT),
            ),
        }
    }
}

/// List products from the catalog.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let products = state
        .catalog()
        .list_products(&query.listing())
        .await
        .map_err(|e| AppError::upstream("Error fetching products", e))?;

    Ok(Json(products))
}

/// Fetch one product from the catalog.
#[instrument(skip(state))]
pub async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let product = state
        .catalog()
        .get_product(&id)
        .await
        .map_err(|e| AppError::upstream("Error fetching product details", e))?;

    Ok(Json(product))
}
