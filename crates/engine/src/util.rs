//! Internal helpers for input normalization and side-effect handling.
//!
//! These utilities are **not** part of the public API.

use sea_orm::{DbErr, SqlErr};

use crate::ResultEngine;

/// Trimmed text, or `None` when blank.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trimmed text, or `None` when blank. Callers turn `None` into a field error.
pub(crate) fn normalize_required_text(value: &str) -> Option<String> {
    normalize_optional_text(Some(value))
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Logs and discards the failure of a write that must not fail its caller
/// (audit entries, notifications, attachment cleanup).
pub(crate) fn best_effort(label: &str, result: ResultEngine<()>) {
    if let Err(err) = result {
        tracing::warn!(error = %err, "{label} failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_normalizes_to_none() {
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(
            normalize_optional_text(Some("  7-Eleven ")),
            Some("7-Eleven".to_string())
        );
        assert_eq!(normalize_required_text("\t"), None);
    }
}
