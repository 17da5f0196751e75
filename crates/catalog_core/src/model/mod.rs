//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records persisted by the category and item stores.
//! - Own field-level validation shared by stores and the catalog service.
//!
//! # Invariants
//! - Identities are store-assigned integers and are never reused.
//! - Category names are unique; items reference categories by id.

pub mod category;
pub mod item;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failures for catalog records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Item name is blank after trim.
    EmptyItemName,
    /// Category name is blank after trim.
    EmptyCategoryName,
    /// Image name is blank after trim.
    EmptyImageName,
    /// Image payload has no bytes.
    EmptyImage,
    /// Item references a category id that cannot exist.
    InvalidCategoryId(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyItemName => write!(f, "item name must not be blank"),
            Self::EmptyCategoryName => write!(f, "category name must not be blank"),
            Self::EmptyImageName => write!(f, "image name must not be blank"),
            Self::EmptyImage => write!(f, "image must not be empty"),
            Self::InvalidCategoryId(id) => write!(f, "invalid category id: {id}"),
        }
    }
}

impl Error for ValidationError {}
