//! HTTP client, session cache and headless home view for the catalog API.

pub mod client;
pub mod error;
pub mod store;
pub mod view;

pub use client::{CatalogClient, FetchRequest};
pub use error::ClientError;
pub use store::{CatalogState, ClientStore, FailureKind, StoreOutcome};
pub use view::HomeView;
