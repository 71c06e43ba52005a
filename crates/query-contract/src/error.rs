//! Error types.
//!
//! Two tiers:
//! - [`ConfigError`]: raised while declaring or composing a contract. Fatal;
//!   a service should refuse to start.
//! - [`FieldError`]: raised while validating one request. All field errors of
//!   a request are collected into [`ValidationErrors`].

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operator::{FilterOperator, ValueKind};

/// Declaration-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {module} bounds: {detail}")]
    InvalidBounds {
        module: &'static str,
        detail: String,
    },

    #[error("{module} requires at least one {what}")]
    EmptyFieldSet {
        module: &'static str,
        what: &'static str,
    },

    #[error("filter field '{field}' has no operators")]
    EmptyOperatorSet { field: String },

    #[error("operator '{operator}' is not legal for {kind} field '{field}'")]
    IllegalOperator {
        field: String,
        operator: FilterOperator,
        kind: ValueKind,
    },

    #[error("operator '{operator}' on field '{field}' requires the field to be nullable")]
    NullOperatorOnNonNullable {
        field: String,
        operator: FilterOperator,
    },

    #[error("default sort field '{field}' is not one of the sortable fields")]
    UnknownDefaultField { field: String },

    #[error("{module} field '{field}' is declared more than once")]
    DuplicateField { module: &'static str, field: String },

    #[error("{module} field name '{field}' contains invalid characters")]
    InvalidFieldName { module: &'static str, field: String },

    #[error("filter field name '{field}' is reserved for logical groups")]
    ReservedFieldName { field: String },

    #[error("enum field '{field}' declares no values")]
    EmptyEnum { field: String },

    #[error("default for field '{field}' is invalid: {detail}")]
    InvalidDefault { field: String, detail: String },

    #[error("field name collision: '{name}' is introduced by both {first} and {second}")]
    FieldCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// Machine-readable kind of a request-time field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldErrorKind {
    #[serde(rename = "OutOfRangeError")]
    OutOfRange,
    #[serde(rename = "UnknownFieldError")]
    UnknownField,
    #[serde(rename = "UnknownOperatorError")]
    UnknownOperator,
    #[serde(rename = "TypeMismatchError")]
    TypeMismatch,
    #[serde(rename = "QueryLengthError")]
    QueryLength,
    #[serde(rename = "MissingRequiredFieldError")]
    MissingRequiredField,
    #[serde(rename = "ExclusiveModeViolation")]
    ExclusiveModeViolation,
}

impl FieldErrorKind {
    /// Wire name of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldErrorKind::OutOfRange => "OutOfRangeError",
            FieldErrorKind::UnknownField => "UnknownFieldError",
            FieldErrorKind::UnknownOperator => "UnknownOperatorError",
            FieldErrorKind::TypeMismatch => "TypeMismatchError",
            FieldErrorKind::QueryLength => "QueryLengthError",
            FieldErrorKind::MissingRequiredField => "MissingRequiredFieldError",
            FieldErrorKind::ExclusiveModeViolation => "ExclusiveModeViolation",
        }
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem with one wire field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Offending wire key; nested filter keys carry their path (`_or[1].age_gt`).
    pub field: String,

    /// Machine-readable error kind.
    pub kind: FieldErrorKind,

    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::OutOfRange, message)
    }

    pub fn unknown_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::UnknownField, message)
    }

    pub fn unknown_operator(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::UnknownOperator, message)
    }

    pub fn type_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::TypeMismatch, message)
    }

    pub fn query_length(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::QueryLength, message)
    }

    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::MissingRequiredField, message)
    }

    pub fn exclusive(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::ExclusiveModeViolation, message)
    }
}

/// Every field error produced while validating one request.
///
/// Never empty when returned from [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of field errors.
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// Whether any error targets `field` with the given kind.
    pub fn has(&self, field: &str, kind: FieldErrorKind) -> bool {
        self.0.iter().any(|e| e.field == field && e.kind == kind)
    }

    /// Whether any error has the given kind.
    pub fn has_kind(&self, kind: FieldErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// Errors for a single wire field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.field == field)
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl Deref for ValidationErrors {
    type Target = [FieldError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "query validation failed: {}", joined.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn field_error_kind_serializes_to_wire_name() {
        let json = serde_json::to_string(&FieldErrorKind::UnknownOperator).unwrap();
        assert_eq!(json, "\"UnknownOperatorError\"");
        assert_eq!(FieldErrorKind::QueryLength.to_string(), "QueryLengthError");
    }

    #[test]
    fn validation_errors_display_joins_all() {
        let errors = ValidationErrors::new(vec![
            FieldError::out_of_range("limit", "must be at most 100"),
            FieldError::unknown_field("foo", "unknown query parameter"),
        ]);
        let text = errors.to_string();
        assert!(text.contains("limit: must be at most 100"));
        assert!(text.contains("foo: unknown query parameter"));
        assert_eq!(errors.len(), 2);
        assert!(errors.has("foo", FieldErrorKind::UnknownField));
        assert!(!errors.has("limit", FieldErrorKind::UnknownField));
    }

    #[test]
    fn collision_message_names_both_owners() {
        let err = ConfigError::FieldCollision {
            name: "limit".to_string(),
            first: "pagination".to_string(),
            second: "extra".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "field name collision: 'limit' is introduced by both pagination and extra"
        );
    }
}
