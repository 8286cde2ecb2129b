//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when submitted fields fail validation; carries a
//!   field-keyed message map and guarantees nothing was persisted.
//! - [`ConstraintViolation`] thrown when a uniqueness rule is broken (e.g. a
//!   second budget for the same scope and month).
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`LookupCreation`] thrown when a free-text category or payment method can
//!   be neither created nor found.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`ConstraintViolation`]: EngineError::ConstraintViolation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`LookupCreation`]: EngineError::LookupCreation
use std::{collections::BTreeMap, fmt};

use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

use crate::ResultEngine;

/// Field name → user-facing message, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field`, replacing an earlier message.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise a [`EngineError::Validation`].
    pub fn into_result(self) -> ResultEngine<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Lookup creation failed: {0}")]
    LookupCreation(String),
    #[error("Object store error: {0}")]
    ObjectStore(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Shortcut for a validation error on a single field.
    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, message);
        Self::Validation(errors)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::ConstraintViolation(a), Self::ConstraintViolation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::LookupCreation(a), Self::LookupCreation(b)) => a == b,
            (Self::ObjectStore(a), Self::ObjectStore(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn field_errors_serialize_as_object() {
        let mut errors = FieldErrors::new();
        errors.insert("description", "กรุณาระบุรายละเอียด");
        errors.insert("amount", "จำนวนเงินต้องเป็นตัวเลขมากกว่า 0");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["amount"], "จำนวนเงินต้องเป็นตัวเลขมากกว่า 0");
        assert_eq!(json["description"], "กรุณาระบุรายละเอียด");
        assert_eq!(
            errors.to_string(),
            "amount: จำนวนเงินต้องเป็นตัวเลขมากกว่า 0; description: กรุณาระบุรายละเอียด"
        );
    }
}
