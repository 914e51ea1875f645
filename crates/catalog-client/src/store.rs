//! Session-scoped product cache mirroring the API.
//!
//! [`ClientStore`] is a cheap-to-clone handle; clones share one state. The
//! state lock is only held while reading or applying a transition, never
//! across a network call.

use std::sync::Arc;

use catalog_core::{Product, ProductId, ProductInput, ProductPatch, ValidationError};
use tokio::sync::Mutex;

use crate::client::{CatalogClient, FetchRequest};
use crate::error::ClientError;

/// Snapshot of the cached listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    pub products: Vec<Product>,
    pub loading: bool,
    pub has_more: bool,
    pub page: u32,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            loading: false,
            has_more: true,
            page: 1,
        }
    }
}

/// Why a write did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected locally before any request was sent.
    Validation,
    /// The API answered and refused.
    Rejected,
    /// The API could not be reached or answered with something unreadable.
    Transport,
}

/// Result of a write, reported to the caller instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    pub success: bool,
    pub message: String,
    pub kind: Option<FailureKind>,
}

impl StoreOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
        }
    }

    fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: Some(kind),
        }
    }

    /// A 2xx `success: false` answer carries the API's own message; anything
    /// else gets `fallback`.
    fn from_error(error: &ClientError, fallback: &str) -> Self {
        match error {
            ClientError::Rejected(message) => Self::failed(FailureKind::Rejected, message.clone()),
            ClientError::Status { .. } => Self::failed(FailureKind::Rejected, fallback),
            ClientError::Http(_)
            | ClientError::Deserialize { .. }
            | ClientError::InvalidBaseUrl { .. } => Self::failed(FailureKind::Transport, fallback),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientStore {
    client: Arc<CatalogClient>,
    state: Arc<Mutex<CatalogState>>,
}

impl ClientStore {
    #[must_use]
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client: Arc::new(client),
            state: Arc::new(Mutex::new(CatalogState::default())),
        }
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.state.lock().await.clone()
    }

    /// Clears the list and re-arms paging.
    pub async fn reset_products(&self) {
        let mut state = self.state.lock().await;
        state.products.clear();
        state.page = 1;
        state.has_more = true;
    }

    pub async fn set_products(&self, products: Vec<Product>) {
        self.state.lock().await.products = products;
    }

    /// Loads one page: page 1 replaces the list, later pages append.
    ///
    /// `has_more` follows whether the page came back non-empty. A failed
    /// request stops paging and keeps the products already loaded.
    pub async fn fetch_products(&self, request: FetchRequest) {
        self.state.lock().await.loading = true;

        let result = self.client.list_products(&request).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(products) => {
                state.has_more = !products.is_empty();
                if request.page == 1 {
                    state.products = products;
                } else {
                    state.products.extend(products);
                }
                state.page = request.page;
            }
            Err(e) => {
                tracing::warn!(page = request.page, error = %e, "failed to fetch products");
                state.has_more = false;
            }
        }
        state.loading = false;
    }

    /// Validates locally, then creates the product and appends it.
    pub async fn create_product(&self, input: ProductInput) -> StoreOutcome {
        match input.clone().validate() {
            Ok(_) => {}
            Err(ValidationError::MissingFields) => {
                return StoreOutcome::failed(FailureKind::Validation, "Please fill in all fields.");
            }
            Err(e @ ValidationError::InvalidPrice(_)) => {
                return StoreOutcome::failed(FailureKind::Validation, e.to_string());
            }
        }

        match self.client.create_product(&input).await {
            Ok(product) => {
                self.state.lock().await.products.push(product);
                StoreOutcome::ok("Product created successfully")
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create product");
                StoreOutcome::from_error(&e, "Error creating product.")
            }
        }
    }

    /// Updates the product and swaps the returned record into the list.
    ///
    /// When the API reports no such product the list is left as is.
    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> StoreOutcome {
        match self.client.update_product(id, patch).await {
            Ok(updated) => {
                if let Some(updated) = updated {
                    let mut state = self.state.lock().await;
                    for product in state.products.iter_mut().filter(|p| p.id == updated.id) {
                        *product = updated.clone();
                    }
                }
                StoreOutcome::ok("Product updated successfully")
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to update product");
                StoreOutcome::from_error(&e, "Error updating product.")
            }
        }
    }

    /// Deletes the product and drops it from the list.
    pub async fn delete_product(&self, id: &str) -> StoreOutcome {
        match self.client.delete_product(id).await {
            Ok(message) => {
                if let Some(id) = ProductId::parse(id) {
                    self.state.lock().await.products.retain(|p| p.id != id);
                }
                StoreOutcome::ok(message)
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to delete product");
                StoreOutcome::from_error(&e, "Error deleting product.")
            }
        }
    }
}
