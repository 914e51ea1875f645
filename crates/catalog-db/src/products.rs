//! Postgres operations for the `products` document table.

use catalog_core::{
    Product, ProductDraft, ProductId, ProductPage, ProductQuery, SearchFilter, SortOrder,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::document::decode_product;
use crate::DbError;

/// Numeric price for filtering and ordering. `CASE` keeps the cast from
/// running on non-numeric values, which `AND` does not guarantee.
const PRICE_EXPR: &str =
    "(CASE WHEN jsonb_typeof(doc -> 'price') = 'number' THEN (doc -> 'price')::float8 END)";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    /// `{name, price, image, description?}`; `price` may be a legacy string.
    pub doc: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Decodes the stored document into a [`Product`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MalformedDocument`] if a required field is missing
    /// or has the wrong type.
    pub fn into_product(self) -> Result<Product, DbError> {
        let id = ProductId::from(self.id);
        match self.doc {
            Value::Object(ref doc) => decode_product(id, doc, self.created_at, self.updated_at),
            _ => Err(DbError::MalformedDocument {
                id: self.id,
                reason: "document is not an object".to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Converts every string-typed `price` to a JSON number in place.
///
/// Idempotent: once no string prices remain the statement matches nothing.
/// `updated_at` is left alone since the record's content does not change.
///
/// Returns the number of documents converted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails, including when a stored
/// string is not numeric (the cast aborts the whole statement).
pub async fn repair_legacy_prices(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET doc = jsonb_set(doc, '{price}', to_jsonb(btrim(doc ->> 'price')::float8)) \
         WHERE jsonb_typeof(doc -> 'price') = 'string'",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns one page of products matching `query` plus the total match count.
///
/// The count runs over the full filtered set, independent of paging.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails, or
/// [`DbError::MalformedDocument`] if a matching document cannot be decoded.
pub async fn list_products(pool: &PgPool, query: &ProductQuery) -> Result<ProductPage, DbError> {
    let mut select: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("SELECT id, doc, created_at, updated_at FROM products");
    push_search_filter(&mut select, query.search.as_ref());
    push_order(&mut select, query.sort);
    select.push(" OFFSET ");
    select.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
    select.push(" LIMIT ");
    select.push_bind(i64::from(query.limit));

    let rows = select
        .build_query_as::<ProductRow>()
        .fetch_all(pool)
        .await?;

    let mut count: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_search_filter(&mut count, query.search.as_ref());
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let products = rows
        .into_iter()
        .map(ProductRow::into_product)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductPage {
        products,
        total: u64::try_from(total).unwrap_or(0),
    })
}

fn push_search_filter(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&SearchFilter>) {
    let Some(search) = search else {
        return;
    };
    let pattern = format!("%{}%", escape_like(search.text()));

    builder.push(" WHERE (doc ->> 'name' ILIKE ");
    builder.push_bind(pattern.clone());
    builder.push(" OR doc ->> 'description' ILIKE ");
    builder.push_bind(pattern.clone());
    builder.push(" OR doc ->> 'image' ILIKE ");
    builder.push_bind(pattern);
    if let Some(price) = search.price() {
        builder.push(" OR ");
        builder.push(PRICE_EXPR);
        builder.push(" = ");
        builder.push_bind(price);
    }
    builder.push(")");
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: Option<SortOrder>) {
    match sort {
        Some(SortOrder::Asc) => {
            builder.push(" ORDER BY ");
            builder.push(PRICE_EXPR);
            builder.push(" ASC NULLS LAST, seq ASC");
        }
        Some(SortOrder::Desc) => {
            builder.push(" ORDER BY ");
            builder.push(PRICE_EXPR);
            builder.push(" DESC NULLS LAST, seq ASC");
        }
        None => {
            builder.push(" ORDER BY seq ASC");
        }
    }
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a new product and returns it with its assigned id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, draft: &ProductDraft) -> Result<Product, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (id, doc) VALUES ($1, $2) \
         RETURNING id, doc, created_at, updated_at",
    )
    .bind(ProductId::generate().as_uuid())
    .bind(Value::Object(draft.to_document()))
    .fetch_one(pool)
    .await?;

    row.into_product()
}

/// Inserts a document exactly as given, without validation or coercion.
///
/// Used to import records from older collections, whose `price` may still be
/// text; the next repair sweep converts it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including when `doc` is not
/// a JSON object).
pub async fn insert_document(pool: &PgPool, doc: &Value) -> Result<ProductId, DbError> {
    let id: Uuid = sqlx::query_scalar("INSERT INTO products (id, doc) VALUES ($1, $2) RETURNING id")
        .bind(ProductId::generate().as_uuid())
        .bind(doc)
        .fetch_one(pool)
        .await?;
    Ok(ProductId::from(id))
}

/// Merges `changes` into the stored document (top-level keys only) and
/// returns the updated product, or `None` if no product has this id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: ProductId,
    changes: &Map<String, Value>,
) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET doc = doc || $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, doc, created_at, updated_at",
    )
    .bind(id.as_uuid())
    .bind(Value::Object(changes.clone()))
    .fetch_optional(pool)
    .await?;

    row.map(ProductRow::into_product).transpose()
}

/// Deletes a product. Returns whether a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: ProductId) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
