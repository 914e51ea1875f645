//! Decoding of stored product documents, shared by every backend.

use catalog_core::products::parse_price;
use catalog_core::{Product, ProductId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::DbError;

pub(crate) fn decode_product(
    id: ProductId,
    doc: &Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<Product, DbError> {
    let malformed = |reason: &str| DbError::MalformedDocument {
        id: id.as_uuid(),
        reason: reason.to_owned(),
    };

    let text = |field: &str| -> Result<String, DbError> {
        match doc.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(malformed(&format!("`{field}` is missing or not a string"))),
        }
    };

    let price = match doc.get("price") {
        Some(Value::Number(n)) => n.as_f64(),
        // Only reachable when a read races a write that bypassed the repair sweep.
        Some(Value::String(s)) => parse_price(s),
        _ => None,
    }
    .ok_or_else(|| malformed("`price` is missing or not numeric"))?;

    let description = match doc.get("description") {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => None,
        Some(_) => return Err(malformed("`description` is not a string")),
    };

    Ok(Product {
        id,
        name: text("name")?,
        price,
        image: text("image")?,
        description,
        created_at,
        updated_at,
    })
}

/// Returns the current price when it is still stored as text.
pub(crate) fn legacy_price(doc: &Map<String, Value>) -> Option<&str> {
    match doc.get("price") {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Numeric price used for sorting; `None` sorts after every number.
pub(crate) fn sort_price(doc: &Map<String, Value>) -> Option<f64> {
    doc.get("price").and_then(Value::as_f64)
}
