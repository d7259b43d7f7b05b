//! # Checker Errors
//!
//! Error types for validation and decoding.
//!
//! Every failure carries the qualified field name (e.g. `user.address.city`
//! or `tags[2]`) and a single descriptive message. Failures are raised at
//! the point of detection and propagate fail-fast; composite checkers do
//! not catch or aggregate them.

use serde_json::Value;
use thiserror::Error;

/// Result type for checker operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Validation and decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// Value absent where the required variant was invoked
    #[error("{field} is marked as required")]
    RequiredMissing {
        /// Qualified field name
        field: String,
    },

    /// Value present but of the wrong kind
    #[error("{field} is not {expected}: found {actual}")]
    TypeMismatch {
        /// Qualified field name
        field: String,
        /// Expected type label
        expected: String,
        /// Actual type name encountered
        actual: String,
    },

    /// Array-of checker received a non-sequence
    #[error("{field} is not an array: found {actual}")]
    NotAnArray {
        /// Qualified field name
        field: String,
        /// Actual type name encountered
        actual: String,
    },

    /// Dictionary-of checker received something other than a keyed object
    #[error("{field} is not a dictionary: found {actual}")]
    NotADictionary {
        /// Qualified field name
        field: String,
        /// Offending type name
        actual: String,
    },

    /// A referenced entity's own validation failed
    #[error("{field} failed {entity} validation: {source}")]
    NestedValidationFailure {
        /// Qualified field name of the reference
        field: String,
        /// Name of the referenced entity
        entity: String,
        /// The underlying failure
        #[source]
        source: Box<CheckError>,
    },

    /// A reference checker's target entity was never registered
    #[error("entity '{name}' is not registered")]
    UnknownEntity {
        /// Entity name the handle was created with
        name: String,
    },

    /// An entity binding with this name was already registered
    #[error("entity '{name}' is already registered")]
    AlreadyRegistered {
        /// Entity name of the rejected binding
        name: String,
    },

    /// Synchronous decode reached an eager reference that needs a lookup
    #[error("{field} is an eager reference: decode requires async resolution")]
    DeferredLookup {
        /// Qualified field name
        field: String,
    },
}

impl CheckError {
    /// Create a required-missing error
    pub fn required(field: impl Into<String>) -> Self {
        Self::RequiredMissing {
            field: field.into(),
        }
    }

    /// Create a type mismatch error, naming the actual JSON type
    pub fn mismatch(field: impl Into<String>, expected: impl Into<String>, actual: &Value) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: json_type_name(actual).to_string(),
        }
    }

    /// Create a not-an-array error
    pub fn not_array(field: impl Into<String>, actual: &Value) -> Self {
        Self::NotAnArray {
            field: field.into(),
            actual: json_type_name(actual).to_string(),
        }
    }

    /// Create a not-a-dictionary error
    pub fn not_dictionary(field: impl Into<String>, actual: &Value) -> Self {
        Self::NotADictionary {
            field: field.into(),
            actual: json_type_name(actual).to_string(),
        }
    }

    /// Wrap a referenced entity's own validation failure
    pub fn nested(field: impl Into<String>, entity: impl Into<String>, source: CheckError) -> Self {
        Self::NestedValidationFailure {
            field: field.into(),
            entity: entity.into(),
            source: Box::new(source),
        }
    }

    /// Create an unknown-entity error
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }

    /// Create a deferred-lookup error
    pub fn deferred(field: impl Into<String>) -> Self {
        Self::DeferredLookup {
            field: field.into(),
        }
    }

    /// Returns the qualified field name this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::RequiredMissing { field }
            | Self::TypeMismatch { field, .. }
            | Self::NotAnArray { field, .. }
            | Self::NotADictionary { field, .. }
            | Self::NestedValidationFailure { field, .. }
            | Self::DeferredLookup { field } => Some(field),
            Self::UnknownEntity { .. } | Self::AlreadyRegistered { .. } => None,
        }
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
