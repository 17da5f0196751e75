//! Catalog use-case service.
//!
//! # Responsibility
//! - Execute "add item" across the category, image, and item stores.
//! - Forward read paths so callers can depend on one entry point.
//!
//! # Invariants
//! - Request fields are validated before any store mutation.
//! - Image bytes are durably stored before the item row is inserted, so every
//!   visible item has a resolvable image.
//! - An insert failure after a successful image write leaves the image
//!   orphaned; it is logged, never rolled back.

use crate::cancel::Cancellation;
use crate::image::{ImageStore, ImageStoreError};
use crate::model::category::{validate_category_name, Category, CategoryId};
use crate::model::item::{Item, ItemId, ItemView};
use crate::model::ValidationError;
use crate::repo::category_repo::CategoryStore;
use crate::repo::item_repo::ItemStore;
use crate::repo::RepoError;
use log::{info, log, warn, Level};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Input for [`CatalogService::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItemRequest {
    pub name: String,
    /// Category name; created on first use.
    pub category: String,
    /// Raw image bytes.
    pub image: Vec<u8>,
}

impl AddItemRequest {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        image: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            image: image.into(),
        }
    }

    /// Checks required fields without touching any store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        validate_category_name(&self.category)?;
        if self.image.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        Ok(())
    }
}

/// Service error naming the step that failed.
#[derive(Debug)]
pub enum CatalogError {
    /// Request rejected before any store mutation.
    Validation(ValidationError),
    /// Category resolution or lookup failed.
    Category(RepoError),
    /// Image write or read failed.
    Image(ImageStoreError),
    /// Item insert or read failed.
    Item(RepoError),
}

impl CatalogError {
    /// Returns whether the requested item, category, or image does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Category(err) | Self::Item(err) => err.is_not_found(),
            Self::Image(err) => matches!(err, ImageStoreError::ImageNotFound(_)),
            Self::Validation(_) => false,
        }
    }

    /// Returns whether the caller's handle fired during the failed step.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Category(err) | Self::Item(err) => err.is_cancelled(),
            Self::Image(err) => err.is_cancelled(),
            Self::Validation(_) => false,
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid request: {err}"),
            Self::Category(err) => write!(f, "category store: {err}"),
            Self::Image(err) => write!(f, "image store: {err}"),
            Self::Item(err) => write!(f, "item store: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Category(err) | Self::Item(err) => Some(err),
            Self::Image(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Use-case service composing the three catalog stores.
pub struct CatalogService<C, I, S> {
    categories: C,
    items: I,
    images: S,
}

impl<C, I, S> CatalogService<C, I, S>
where
    C: CategoryStore,
    I: ItemStore,
    S: ImageStore,
{
    /// Creates a service over the provided store implementations.
    pub fn new(categories: C, items: I, images: S) -> Self {
        Self {
            categories,
            items,
            images,
        }
    }

    /// Adds one item: resolve category, store image, insert row.
    ///
    /// # Contract
    /// - Blank name/category or empty image fails with `Validation` and
    ///   mutates nothing.
    /// - Category or image failure leaves no item row.
    /// - Returns the inserted item with its category name filled in.
    pub fn add_item(
        &self,
        cancel: &Cancellation,
        request: &AddItemRequest,
    ) -> CatalogResult<ItemView> {
        request.validate()?;

        let category_id = self
            .categories
            .get_or_create(cancel, &request.category)
            .map_err(|err| {
                let err = CatalogError::Category(err);
                log_step_failure(&err, "category_resolve_failed");
                err
            })?;

        let image_name = self.images.put(cancel, &request.image).map_err(|err| {
            let err = CatalogError::Image(err);
            log_step_failure(&err, "image_write_failed");
            err
        })?;

        let mut item = Item::new(request.name.as_str(), category_id, image_name);
        if let Err(err) = self.items.insert(cancel, &mut item) {
            let err = CatalogError::Item(err);
            let (_, error_code) = failure_log_fields(&err, "item_insert_failed");
            warn!(
                "event=item_add module=service status=error error_code={} orphan_image={} error={}",
                error_code, item.image_name, err
            );
            return Err(err);
        }

        info!(
            "event=item_add module=service status=ok id={} category_id={}",
            item.id, category_id
        );
        Ok(item.into_view(request.category.as_str()))
    }

    /// Lists all items in insertion order.
    pub fn list_items(&self, cancel: &Cancellation) -> CatalogResult<Vec<ItemView>> {
        self.items.list(cancel).map_err(CatalogError::Item)
    }

    /// Gets one item by id.
    pub fn get_item(&self, cancel: &Cancellation, id: ItemId) -> CatalogResult<ItemView> {
        self.items.select(cancel, id).map_err(CatalogError::Item)
    }

    /// Searches items whose name contains `keyword`.
    pub fn search_items(
        &self,
        cancel: &Cancellation,
        keyword: &str,
    ) -> CatalogResult<Vec<ItemView>> {
        self.items
            .search_by_keyword(cancel, keyword)
            .map_err(CatalogError::Item)
    }

    pub fn get_category(&self, cancel: &Cancellation, id: CategoryId) -> CatalogResult<Category> {
        self.categories
            .get_by_id(cancel, id)
            .map_err(CatalogError::Category)
    }

    pub fn list_categories(&self, cancel: &Cancellation) -> CatalogResult<Vec<Category>> {
        self.categories.list(cancel).map_err(CatalogError::Category)
    }

    /// Reads the image bytes referenced by an item view.
    pub fn read_image(&self, cancel: &Cancellation, image_name: &str) -> CatalogResult<Vec<u8>> {
        self.images
            .get(cancel, image_name)
            .map_err(CatalogError::Image)
    }
}

/// Cancellation is a caller decision, not a store failure.
fn failure_log_fields(err: &CatalogError, error_code: &'static str) -> (Level, &'static str) {
    if err.is_cancelled() {
        (Level::Info, "cancelled")
    } else {
        (Level::Error, error_code)
    }
}

fn log_step_failure(err: &CatalogError, error_code: &'static str) {
    let (level, error_code) = failure_log_fields(err, error_code);
    log!(
        level,
        "event=item_add module=service status=error error_code={} error={}",
        error_code,
        err
    );
}

#[cfg(test)]
mod tests {
    use super::{failure_log_fields, CatalogError};
    use crate::cancel::CancelReason;
    use crate::image::ImageStoreError;
    use crate::repo::RepoError;
    use log::Level;

    #[test]
    fn cancelled_steps_log_below_error_with_their_own_code() {
        let category = CatalogError::Category(RepoError::Cancelled(CancelReason::Cancelled));
        assert_eq!(
            failure_log_fields(&category, "category_resolve_failed"),
            (Level::Info, "cancelled")
        );

        let image = CatalogError::Image(ImageStoreError::Cancelled(CancelReason::DeadlineExceeded));
        assert_eq!(
            failure_log_fields(&image, "image_write_failed"),
            (Level::Info, "cancelled")
        );
    }

    #[test]
    fn store_failures_keep_error_level_and_step_code() {
        let image = CatalogError::Image(ImageStoreError::ImageNotFound("a.jpg".to_string()));
        assert!(!image.is_cancelled());
        assert_eq!(
            failure_log_fields(&image, "image_write_failed"),
            (Level::Error, "image_write_failed")
        );

        let item = CatalogError::Item(RepoError::ItemNotFound(7));
        assert_eq!(
            failure_log_fields(&item, "item_insert_failed"),
            (Level::Error, "item_insert_failed")
        );
    }
}
