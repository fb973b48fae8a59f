//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so every entity trims and checks text the same way.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Default page size for list operations.
pub const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 1000;

/// Offset based pagination shared by every list operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

fn nfkc_trim(value: &str) -> String {
    value.nfkc().collect::<String>().trim().to_string()
}

/// Normalize a required text field, rejecting blank values.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let normalized = nfkc_trim(value);
    if normalized.is_empty() {
        return Err(EngineError::Invalid(format!("{label} must not be empty")));
    }
    Ok(normalized)
}

/// Normalize an optional text field; blank values become `None`.
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value.map(nfkc_trim).filter(|s| !s.is_empty())
}

/// Apply an optional patch to a required text field.
pub(crate) fn patch_required(
    current: &mut String,
    value: Option<&str>,
    label: &str,
) -> ResultEngine<bool> {
    match value {
        Some(value) => {
            let normalized = normalize_required(value, label)?;
            let changed = *current != normalized;
            *current = normalized;
            Ok(changed)
        }
        None => Ok(false),
    }
}

/// Apply an optional patch to a nullable text field. `None` keeps the value.
pub(crate) fn patch_optional(current: &mut Option<String>, value: Option<&str>) {
    if let Some(value) = value {
        *current = normalize_optional(Some(value));
    }
}

pub(crate) fn ensure_non_negative(value: i32, label: &str) -> ResultEngine<()> {
    if value < 0 {
        return Err(EngineError::Invalid(format!("{label} must be >= 0")));
    }
    Ok(())
}

pub(crate) fn ensure_positive(value: i32, label: &str) -> ResultEngine<()> {
    if value <= 0 {
        return Err(EngineError::Invalid(format!("{label} must be > 0")));
    }
    Ok(())
}
