//! In-process product store with the same semantics as the Postgres backend.
//!
//! Records keep insertion order, which is the natural order for unsorted
//! listings. Documents are held as raw JSON so legacy text prices can exist
//! until the repair sweep converts them.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::products::parse_price;
use catalog_core::{
    Product, ProductDraft, ProductId, ProductPage, ProductQuery, SearchFilter, SortOrder,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::document::{decode_product, legacy_price, sort_price};
use crate::store::ProductStore;
use crate::DbError;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: ProductId,
    doc: Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredDocument {
    fn decode(&self) -> Result<Product, DbError> {
        decode_product(self.id, &self.doc, self.created_at, self.updated_at)
    }

    fn matches(&self, search: &SearchFilter) -> bool {
        let text_hit = ["name", "description", "image"].iter().any(|field| {
            self.doc
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|s| search.matches_text(s))
        });
        text_hit || sort_price(&self.doc).is_some_and(|p| search.matches_price(p))
    }
}

/// Cheap to clone; clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryProductStore {
    documents: Arc<RwLock<Vec<StoredDocument>>>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document exactly as given, without validation or coercion.
    ///
    /// Counterpart of [`crate::insert_document`] for imports of older
    /// records whose `price` may still be text.
    pub async fn insert_document(&self, doc: Map<String, Value>) -> ProductId {
        let id = ProductId::generate();
        let now = Utc::now();
        self.documents.write().await.push(StoredDocument {
            id,
            doc,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Returns the raw stored document for `id`, if present.
    pub async fn document(&self, id: ProductId) -> Option<Map<String, Value>> {
        self.documents
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.doc.clone())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn repair_prices(&self) -> Result<u64, DbError> {
        let mut documents = self.documents.write().await;

        // Convert everything or nothing, like the single UPDATE statement.
        let mut converted = Vec::new();
        for (index, stored) in documents.iter().enumerate() {
            if let Some(raw) = legacy_price(&stored.doc) {
                let value = parse_price(raw).ok_or_else(|| DbError::PriceCoercion {
                    id: stored.id.as_uuid(),
                    value: raw.to_owned(),
                })?;
                converted.push((index, value));
            }
        }

        for (index, value) in &converted {
            documents[*index]
                .doc
                .insert("price".to_owned(), Value::from(*value));
        }

        Ok(u64::try_from(converted.len()).unwrap_or(u64::MAX))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, DbError> {
        let documents = self.documents.read().await;

        let mut matching: Vec<&StoredDocument> = documents
            .iter()
            .filter(|d| query.search.as_ref().map_or(true, |s| d.matches(s)))
            .collect();

        if let Some(order) = query.sort {
            // Stable sort keeps insertion order among equal prices.
            matching.sort_by(|a, b| {
                compare_prices(sort_price(&a.doc), sort_price(&b.doc), order)
            });
        }

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        let products = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(StoredDocument::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage { products, total })
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, DbError> {
        let now = Utc::now();
        let stored = StoredDocument {
            id: ProductId::generate(),
            doc: draft.to_document(),
            created_at: now,
            updated_at: now,
        };
        let product = stored.decode()?;
        self.documents.write().await.push(stored);
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &Map<String, Value>,
    ) -> Result<Option<Product>, DbError> {
        let mut documents = self.documents.write().await;
        let Some(stored) = documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        for (key, value) in changes {
            stored.doc.insert(key.clone(), value.clone());
        }
        stored.updated_at = Utc::now();
        stored.decode().map(Some)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, DbError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| d.id != id);
        Ok(documents.len() < before)
    }

    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }
}

/// Orders numeric prices by `order`; records without a numeric price go last.
fn compare_prices(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
