//! Category domain model.
//!
//! # Invariants
//! - `name` is unique across the store, trimmed and non-blank.
//! - `usage_count` only grows when a newly created task is first associated
//!   with the category.

use serde::{Deserialize, Serialize};

/// Storage identifier for categories.
pub type CategoryId = i64;

/// Label returned whenever no better category can be derived.
pub const FALLBACK_CATEGORY: &str = "General";
/// Maximum accepted category name length, in chars.
pub const CATEGORY_NAME_MAX_CHARS: usize = 100;

/// Category row with usage statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub usage_count: u32,
}

/// Category name validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryNameError {
    #[error("category name must not be blank")]
    Blank,
    #[error("category name has {len} chars; at most {max} allowed")]
    TooLong { len: usize, max: usize },
}

/// Trims and validates a category name for persistence.
pub fn normalize_category_name(name: &str) -> Result<String, CategoryNameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CategoryNameError::Blank);
    }
    let len = trimmed.chars().count();
    if len > CATEGORY_NAME_MAX_CHARS {
        return Err(CategoryNameError::TooLong {
            len,
            max: CATEGORY_NAME_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}
