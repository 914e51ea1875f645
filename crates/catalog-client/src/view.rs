//! Headless home screen: search box, infinite product list, empty state.

use std::fmt::Write as _;

use catalog_core::{Product, SortOrder};

use crate::client::FetchRequest;
use crate::store::{CatalogState, ClientStore};

const TITLE: &str = "Current Products";
const EMPTY_STATE: &str = "No products found. Create a product with `catalog-cli create`.";

/// Drives a [`ClientStore`] the way the home page does.
///
/// Typing only stages `search_input`; [`HomeView::submit_search`] commits it.
/// Committing a different term restarts the listing from page 1.
#[derive(Debug, Clone)]
pub struct HomeView {
    store: ClientStore,
    search_input: String,
    search_term: String,
    sort_by: Option<SortOrder>,
    page: u32,
}

impl HomeView {
    #[must_use]
    pub fn new(store: ClientStore) -> Self {
        Self {
            store,
            search_input: String::new(),
            search_term: String::new(),
            sort_by: None,
            page: 1,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: Option<SortOrder>) -> Self {
        self.sort_by = sort_by;
        self
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Initial load.
    pub async fn mount(&mut self) {
        self.reload().await;
    }

    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.search_input = input.into();
    }

    /// Commits the staged input. Reloads only when the term changed.
    pub async fn submit_search(&mut self) {
        if self.search_input == self.search_term {
            return;
        }
        self.search_term = self.search_input.clone();
        self.reload().await;
    }

    /// Scroll sentinel came into view: load the next page if there is one
    /// and nothing is in flight.
    pub async fn on_sentinel_visible(&mut self) {
        let state = self.store.snapshot().await;
        if !state.has_more || state.loading {
            return;
        }
        self.page += 1;
        self.store.fetch_products(self.request(self.page)).await;
    }

    pub async fn render(&self) -> String {
        render_state(&self.store.snapshot().await, &self.search_input)
    }

    async fn reload(&mut self) {
        self.store.reset_products().await;
        self.page = 1;
        self.store.fetch_products(self.request(1)).await;
    }

    fn request(&self, page: u32) -> FetchRequest {
        FetchRequest {
            page,
            search: self.search_term.clone(),
            sort_by: self.sort_by,
        }
    }
}

/// Plain-text rendering of a listing state.
#[must_use]
pub fn render_state(state: &CatalogState, search_input: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "Search: {search_input}");
    let _ = writeln!(out);

    for (index, product) in state.products.iter().enumerate() {
        render_card(&mut out, index + 1, product);
    }

    if state.loading {
        let _ = writeln!(out, "Loading...");
    } else if state.products.is_empty() {
        let _ = writeln!(out, "{EMPTY_STATE}");
    }
    out
}

fn render_card(out: &mut String, position: usize, product: &Product) {
    let _ = writeln!(out, "{position:>3}. {} - ${:.2}", product.name, product.price);
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "     {description}");
    }
    let _ = writeln!(out, "     image: {}", product.image);
    let _ = writeln!(out, "     id: {}", product.id);
}
