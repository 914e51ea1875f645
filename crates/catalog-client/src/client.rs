//! HTTP client for the catalog REST API.
//!
//! Wraps `reqwest` with envelope handling: every endpoint answers
//! `{success, data | products, message?}`, and a `success: false` body or a
//! non-2xx status surfaces as a [`ClientError`].

use std::time::Duration;

use catalog_core::{Product, ProductInput, ProductPatch, SortOrder};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;

use crate::error::ClientError;

/// Parameters for one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub page: u32,
    pub search: String,
    pub sort_by: Option<SortOrder>,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            sort_by: None,
        }
    }
}

impl FetchRequest {
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// Client for the catalog REST API.
///
/// Use [`CatalogClient::new`] with the API's base URL; tests point it at a
/// wiremock server.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client rooted at `base_url` (e.g. `http://localhost:5100`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("catalog-client/0.1")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Fetches one page of products.
    ///
    /// Reads `products` from the envelope, falling back to `data`, and to an
    /// empty list when neither is present.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Status`] / [`ClientError::Rejected`] if the API
    ///   refuses the request.
    /// - [`ClientError::Deserialize`] if the products do not match the
    ///   expected shape.
    pub async fn list_products(&self, request: &FetchRequest) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("api/products")?;
        url.query_pairs_mut()
            .append_pair("page", &request.page.to_string())
            .append_pair("search", &request.search)
            .append_pair("sortBy", request.sort_by.map_or("", SortOrder::as_str));

        let body = self.send(self.client.request(Method::GET, url)).await?;
        let list = body
            .get("products")
            .or_else(|| body.get("data"))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        serde_json::from_value(list).map_err(|e| ClientError::Deserialize {
            context: format!("list_products(page={})", request.page),
            source: e,
        })
    }

    /// Creates a product and returns the stored record.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::list_products`].
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        let url = self.endpoint("api/products")?;
        let body = self
            .send(self.client.request(Method::POST, url).json(input))
            .await?;
        Self::decode_data(body, "create_product")
    }

    /// Applies a partial update. `Ok(None)` when the id is unknown to the API.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::list_products`].
    pub async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, ClientError> {
        let url = self.product_url(id)?;
        let body = self
            .send(self.client.request(Method::PUT, url).json(patch))
            .await?;
        Self::decode_data(body, "update_product")
    }

    /// Deletes a product and returns the API's confirmation message.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::list_products`].
    pub async fn delete_product(&self, id: &str) -> Result<String, ClientError> {
        let url = self.product_url(id)?;
        let body = self.send(self.client.request(Method::DELETE, url)).await?;
        Ok(message_of(&body).unwrap_or_default())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    fn product_url(&self, id: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint("api/products")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_owned(),
            })?
            .push(id);
        Ok(url)
    }

    /// Sends the request and unwraps the envelope.
    ///
    /// A body that is not JSON is tolerated for non-2xx responses so the
    /// status still surfaces as [`ClientError::Status`].
    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(message_of)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            tracing::debug!(status = status.as_u16(), %message, "catalog API error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| ClientError::Deserialize {
            context: format!("response body ({status})"),
            source: e,
        })?;

        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ClientError::Rejected(
                message_of(&body).unwrap_or_else(|| "request rejected".to_owned()),
            ));
        }

        Ok(body)
    }

    fn decode_data<T: serde::de::DeserializeOwned>(
        mut body: Value,
        context: &str,
    ) -> Result<T, ClientError> {
        let data = body.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

fn message_of(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
