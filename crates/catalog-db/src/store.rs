//! The storage seam used by the API: one trait, one implementation per backend.

use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::{
    AppConfig, Product, ProductDraft, ProductId, ProductPage, ProductQuery, StoreBackend,
};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::{products, DbError, MemoryProductStore, PoolConfig};

/// Product persistence. Every method is a single store operation; callers
/// never rely on multi-operation atomicity.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Converts legacy text prices to numbers. Returns how many records changed.
    async fn repair_prices(&self) -> Result<u64, DbError>;

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, DbError>;

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, DbError>;

    /// Applies `changes` to the stored document. `Ok(None)` when the id is unknown.
    async fn update_product(
        &self,
        id: ProductId,
        changes: &Map<String, Value>,
    ) -> Result<Option<Product>, DbError>;

    /// Returns whether a record was actually removed.
    async fn delete_product(&self, id: ProductId) -> Result<bool, DbError>;

    async fn health_check(&self) -> Result<(), DbError>;
}

/// [`ProductStore`] backed by the Postgres `products` table.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn repair_prices(&self) -> Result<u64, DbError> {
        products::repair_legacy_prices(&self.pool).await
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, DbError> {
        products::list_products(&self.pool, query).await
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, DbError> {
        products::create_product(&self.pool, draft).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &Map<String, Value>,
    ) -> Result<Option<Product>, DbError> {
        products::update_product(&self.pool, id, changes).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, DbError> {
        products::delete_product(&self.pool, id).await
    }

    async fn health_check(&self) -> Result<(), DbError> {
        crate::health_check(&self.pool).await
    }
}

/// Opens the backend selected by `config.store`.
///
/// For Postgres this connects the pool and applies pending migrations.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if Postgres is selected without a
/// URL, or [`DbError::Sqlx`] / [`DbError::Migration`] if connecting or
/// migrating fails.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ProductStore>, DbError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory product store; data is lost on restart");
            Ok(Arc::new(MemoryProductStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(DbError::MissingDatabaseUrl)?;
            let pool = crate::connect_pool(url, PoolConfig::from_app_config(config)).await?;
            let applied = crate::run_migrations(&pool).await?;
            if applied > 0 {
                tracing::info!(applied, "applied database migrations");
            }
            Ok(Arc::new(PgProductStore::new(pool)))
        }
    }
}
