pub mod app_config;
pub mod config;
pub mod listing;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StoreBackend};
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::{ListParams, ProductPage, ProductQuery, SearchFilter, SortOrder};
pub use products::{
    PriceInput, Product, ProductDraft, ProductId, ProductInput, ProductPatch, ValidationError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
