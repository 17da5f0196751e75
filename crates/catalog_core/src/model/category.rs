//! Category domain model.
//!
//! # Invariants
//! - `name` is non-blank and unique across all categories.
//! - Categories are never updated or deleted once created.

use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned category identity.
pub type CategoryId = i64;

/// Unique category name with its stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Rejects category names that are blank after trim.
///
/// Names are otherwise matched exactly: `"Phone"` and `"phone"` are two
/// different categories.
pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyCategoryName);
    }
    Ok(())
}
