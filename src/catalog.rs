//! Read-only client for the Source Cooperative metadata API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ApiError;

/// A product record from the metadata API. The fields discovery logic needs
/// are typed; everything else the API returns is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Product {
    pub fn is_featured(&self) -> bool {
        self.featured == Some(1)
    }
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<Product>,
}

/// HTTP client for the metadata API and the data proxy.
pub struct CatalogClient {
    http: Client,
    api_base: String,
    data_proxy: String,
}

impl CatalogClient {
    pub fn new(api_base: &str, data_proxy: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            data_proxy: data_proxy.trim_end_matches('/').to_string(),
        })
    }

    /// Published products for one account. Non-success responses are logged
    /// and yield an empty list; discovery is best-effort across accounts.
    pub async fn products(&self, account_id: &str) -> Result<Vec<Product>, ApiError> {
        let url = format!("{}/products/{}", self.api_base, account_id);
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            warn!(account_id, status = %resp.status(), "metadata API returned non-success for account");
            return Ok(Vec::new());
        }

        let body: ProductsResponse = resp.json().await?;
        info!(account_id, count = body.products.len(), "fetched products");
        Ok(body.products)
    }

    /// Full metadata record for one product. Unlike [`Self::products`] a
    /// non-success status is an error here: the caller asked for a specific
    /// product.
    pub async fn product(&self, account_id: &str, product_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/products/{}/{}", self.api_base, account_id, product_id);
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::ApiStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.json().await?)
    }

    /// Fetch object content through the data proxy as text.
    pub async fn fetch_text(&self, key: &str) -> Result<String, ApiError> {
        let url = self.proxy_url(key);
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::ApiStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.text().await?)
    }

    /// Data-proxy URL for a bucket-relative key.
    pub fn proxy_url(&self, key: &str) -> String {
        format!("{}/{}", self.data_proxy, key)
    }
}
