//! Catalog Provider client.
//!
//! The storefront does not own product data. Listing and detail requests are
//! forwarded to the provider and its JSON is returned unchanged. Responses
//! are cached with `moka` (5-minute TTL by default).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to the Catalog Provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("catalog base URL cannot be a base: {0}")]
    InvalidBaseUrl(Url),
}

/// Which slice of the catalog to list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductListing {
    /// Products in one category.
    Category(String),
    /// The first `limit` products.
    Limit(u32),
}

/// Client for the external product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, Value>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` if the base URL cannot have
    /// path segments, or `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl(config.base_url.clone()));
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.inner.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL for a product listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` if the base URL is unusable.
    pub fn listing_url(&self, listing: &ProductListing) -> Result<Url, CatalogError> {
        match listing {
            ProductListing::Category(category) => self.url(&["products", "category", category]),
            ProductListing::Limit(limit) => {
                let mut url = self.url(&["products"])?;
                url.query_pairs_mut()
                    .append_pair("limit", &limit.to_string());
                Ok(url)
            }
        }
    }

    /// URL for a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` if the base URL is unusable.
    pub fn product_url(&self, id: &str) -> Result<Url, CatalogError> {
        self.url(&["products", id])
    }

    /// Fetch a product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, answers with a
    /// non-success status or returns invalid JSON.
    #[instrument(skip(self))]
    pub async fn list_products(&self, listing: &ProductListing) -> Result<Value, CatalogError> {
        let url = self.listing_url(listing)?;
        self.fetch(url).await
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, answers with a
    /// non-success status (including 404) or returns invalid JSON.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<Value, CatalogError> {
        let url = self.product_url(id)?;
        self.fetch(url).await
    }

    async fn fetch(&self, url: Url) -> Result<Value, CatalogError> {
        let cache_key = url.to_string();

        if let Some(value) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for catalog response");
            return Ok(value);
        }

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Catalog provider returned non-success status"
            );
            return Err(CatalogError::Status(status));
        }

        let value: Value = serde_json::from_str(&body)?;

        self.inner.cache.insert(cache_key, value.clone()).await;

        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            cache_ttl: Duration::from_secs(300),
        })
        .unwrap()
    }

    #[test]
    fn test_listing_urls() {
        let catalog = client("https://dummyjson.com");

        assert_eq!(
            catalog
                .listing_url(&ProductListing::Limit(DEFAULT_LIST_LIMIT))
                .unwrap()
                .as_str(),
            "https://dummyjson.com/products?limit=10"
        );
        assert_eq!(
            catalog
                .listing_url(&ProductListing::Category("smartphones".to_string()))
                .unwrap()
                .as_str(),
            "https://dummyjson.com/products/category/smartphones"
        );
    }

    #[test]
    fn test_product_url_encodes_segment() {
        let catalog = client("https://catalog.test/api/");
        assert_eq!(
            catalog.product_url("7").unwrap().as_str(),
            "https://catalog.test/api/products/7"
        );
        assert_eq!(
            catalog.product_url("../admin").unwrap().as_str(),
            "https://catalog.test/api/products/..%2Fadmin"
        );
    }

    #[test]
    fn test_rejects_cannot_be_a_base_url() {
        let result = CatalogClient::new(&CatalogConfig {
            base_url: Url::parse("mailto:catalog@example.com").unwrap(),
            cache_ttl: Duration::from_secs(300),
        });
        assert!(matches!(result, Err(CatalogError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_an_error() {
        let catalog = client("http://127.0.0.1:1");
        assert!(catalog.get_product("1").await.is_err());
    }
}
