//! The product entity and the request shapes that create or modify it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned product identifier.
///
/// The store's native format is a UUID; anything that does not parse as one
/// is treated as an unknown product without a store round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a path segment into an identifier, returning `None` when it is
    /// not syntactically valid.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::try_parse(raw.trim()).ok().map(Self)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ProductId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored product as returned by every read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A price as submitted by a client: either a JSON number or a numeric string
/// such as `"1.5"` (form inputs usually send the latter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Returns the numeric value, or `None` for text that is not a finite number.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            PriceInput::Number(n) if n.is_finite() => Some(*n),
            PriceInput::Number(_) => None,
            PriceInput::Text(s) => parse_price(s),
        }
    }
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        PriceInput::Number(value)
    }
}

/// Parses text into a finite price. Surrounding whitespace is ignored.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide all fields")]
    MissingFields,
    #[error("price must be a number, got '{0}'")]
    InvalidPrice(String),
}

/// Body of a create request before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductInput {
    /// Checks that `name`, `price` and `image` are all present and non-empty.
    ///
    /// A price of zero counts as missing, matching how the form treats an
    /// untouched price input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] when a required field is
    /// absent or empty, or [`ValidationError::InvalidPrice`] when the price is
    /// text that does not parse as a number.
    pub fn validate(self) -> Result<ProductDraft, ValidationError> {
        let name = self.name.filter(|s| !s.is_empty());
        let image = self.image.filter(|s| !s.is_empty());
        let price = match self.price {
            None => None,
            Some(PriceInput::Text(ref s)) if s.trim().is_empty() => None,
            Some(input) => {
                let value = input.to_number().ok_or_else(|| match input {
                    PriceInput::Text(s) => ValidationError::InvalidPrice(s),
                    PriceInput::Number(n) => ValidationError::InvalidPrice(n.to_string()),
                })?;
                Some(value).filter(|v| v.abs() > 0.0)
            }
        };

        match (name, price, image) {
            (Some(name), Some(price), Some(image)) => Ok(ProductDraft {
                name,
                price,
                image,
                description: self.description,
            }),
            _ => Err(ValidationError::MissingFields),
        }
    }
}

/// A validated product ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: f64,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductDraft {
    /// The document body written to the store.
    #[must_use]
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("name".to_owned(), Value::from(self.name.clone()));
        doc.insert("price".to_owned(), Value::from(self.price));
        doc.insert("image".to_owned(), Value::from(self.image.clone()));
        if let Some(description) = &self.description {
            doc.insert("description".to_owned(), Value::from(description.clone()));
        }
        doc
    }
}

/// Sparse update body. Fields left as `None` are not touched.
///
/// `description` distinguishes "not supplied" (`None`) from "cleared"
/// (`Some(None)`, sent as JSON `null`).
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl ProductPatch {
    /// Converts the supplied fields into the document fragment merged into
    /// the stored record. A cleared description maps to JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPrice`] if a supplied price is not
    /// numeric.
    pub fn to_changes(&self) -> Result<Map<String, Value>, ValidationError> {
        let mut changes = Map::new();
        if let Some(name) = &self.name {
            changes.insert("name".to_owned(), Value::from(name.clone()));
        }
        if let Some(price) = &self.price {
            let value = price.to_number().ok_or_else(|| {
                ValidationError::InvalidPrice(match price {
                    PriceInput::Text(s) => s.clone(),
                    PriceInput::Number(n) => n.to_string(),
                })
            })?;
            changes.insert("price".to_owned(), Value::from(value));
        }
        if let Some(image) = &self.image {
            changes.insert("image".to_owned(), Value::from(image.clone()));
        }
        if let Some(description) = &self.description {
            changes.insert(
                "description".to_owned(),
                description.clone().map_or(Value::Null, Value::from),
            );
        }
        Ok(changes)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.description.is_none()
    }
}

// A present key always lands in `Some`, so `null` becomes `Some(None)`.
#[allow(clippy::option_option)]
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
