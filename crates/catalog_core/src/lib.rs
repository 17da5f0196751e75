//! Catalog persistence core.
//! Stores items and categories in SQLite and item images in a
//! content-addressed directory, and coordinates the two on "add item".

pub mod cancel;
pub mod config;
pub mod db;
pub mod image;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cancel::{CancelReason, Cancellation};
pub use config::{CatalogConfig, ConfigError};
pub use image::{FsImageStore, ImageResult, ImageStore, ImageStoreError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::item::{Item, ItemId, ItemView};
pub use model::ValidationError;
pub use repo::category_repo::{CategoryStore, SqliteCategoryStore};
pub use repo::item_repo::{ItemStore, SqliteItemStore};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{AddItemRequest, CatalogError, CatalogResult, CatalogService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
