//! Normalization of list parameters into a store-independent query.
//!
//! The store backends translate a [`ProductQuery`] into their own filter,
//! sort and skip/limit; this module owns the defaults and the `hasMore`
//! arithmetic so every backend agrees on them.

use serde::{Deserialize, Serialize};

use crate::products::{parse_price, Product};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `asc` / `desc`. Anything else means "unsorted".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Raw list parameters as they appear in the query string.
///
/// Everything is text so that a malformed value falls back to its default
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Free-text search over `name`, `description` and `image`, plus an exact
/// price match when the term is numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    text: String,
    lowered: String,
    price: Option<f64>,
}

impl SearchFilter {
    /// Builds a filter, or `None` when the term is blank after trimming.
    ///
    /// The substring match uses the term exactly as given; only the numeric
    /// branch ignores surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self {
            text: raw.to_owned(),
            lowered: raw.to_lowercase(),
            price: parse_price(raw),
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The exact price to match, when the term parses as a number.
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Case-insensitive substring test.
    #[must_use]
    pub fn matches_text(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.lowered)
    }

    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches_price(&self, price: f64) -> bool {
        self.price.is_some_and(|p| p == price)
    }
}

/// A normalized list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: Option<SortOrder>,
    pub search: Option<SearchFilter>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: None,
            search: None,
        }
    }
}

impl ProductQuery {
    #[must_use]
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            page: positive_or(params.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(params.limit.as_deref(), DEFAULT_LIMIT),
            sort: params.sort_by.as_deref().and_then(SortOrder::parse),
            search: params.search.as_deref().and_then(SearchFilter::parse),
        }
    }

    /// Number of matching records to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// `true` iff records remain past this page: `page * limit < total`.
    #[must_use]
    pub fn has_more(&self, total: u64) -> bool {
        u64::from(self.page) * u64::from(self.limit) < total
    }
}

/// Reads the leading integer of `raw` (`"5.0"` and `"5abc"` both give 5).
/// Zero, a sign other than `+`, no leading digits or overflow yield `default`.
fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(leading_integer).filter(|v| *v > 0).unwrap_or(default)
}

fn leading_integer(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse().ok()
}

/// One page of list results together with the size of the full filtered set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
}
