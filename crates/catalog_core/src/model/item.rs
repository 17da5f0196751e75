//! Item domain model.
//!
//! # Responsibility
//! - Define the persisted item row and its denormalized read view.
//!
//! # Invariants
//! - `id == 0` means "not yet inserted"; stores assign positive ids.
//! - `category_id` references an existing category at read time.
//! - `image_name` names bytes already written to the image store.

use super::category::CategoryId;
use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned item identity.
pub type ItemId = i64;

/// Item row as written by the item store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Zero until the store assigns an identity on insert.
    pub id: ItemId,
    pub name: String,
    pub category_id: CategoryId,
    /// Content-addressed name returned by the image store.
    pub image_name: String,
}

impl Item {
    /// Creates an item that has not been inserted yet.
    pub fn new(
        name: impl Into<String>,
        category_id: CategoryId,
        image_name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category_id,
            image_name: image_name.into(),
        }
    }

    /// Checks write-path field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        if self.category_id <= 0 {
            return Err(ValidationError::InvalidCategoryId(self.category_id));
        }
        if self.image_name.trim().is_empty() {
            return Err(ValidationError::EmptyImageName);
        }
        Ok(())
    }

    /// Builds the read view once the category name is known.
    pub fn into_view(self, category: impl Into<String>) -> ItemView {
        ItemView {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
            category: category.into(),
            image_name: self.image_name,
        }
    }
}

/// Item read model with the category name joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    pub category_id: CategoryId,
    /// Denormalized from `categories.name`.
    pub category: String,
    pub image_name: String,
}
