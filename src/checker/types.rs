//! Checker type definitions
//!
//! Supported checker kinds:
//! - scalar: boolean, number, string, array-of-any, generic object
//! - date: RFC 3339 string or millisecond timestamp, decodes to a date
//! - array-of: homogeneous sequence over an element checker
//! - dict-of: string-keyed mapping over a value checker
//! - shape: named fields, each with its own required/optional rule
//! - reference: embedded or fetchable instance of a registered entity
//!
//! A checker is immutable once built and holds no per-call state, so a
//! single value can be shared freely across concurrent validations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityHandle;

use super::errors::CheckResult;

/// Decode strategy for a reference checker.
///
/// Attached at construction time, immutable thereafter. Non-eager decode
/// trusts the embedded payload and materializes it directly; eager decode
/// refetches the canonical record by identifier instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceOptions {
    /// Refetch by identifier instead of trusting embedded data
    #[serde(default)]
    pub eager: bool,
}

impl ReferenceOptions {
    /// Options for the refetch-by-identifier decode mode
    pub fn eager() -> Self {
        Self { eager: true }
    }
}

/// A composable validator for one field's expected shape.
///
/// Only the date and reference kinds (and containers propagating an
/// entity-producing element) participate in decoding; see
/// [`Checker::decodes`].
#[derive(Debug, Clone)]
pub enum Checker {
    /// Basic kind built from a type name and a predicate
    Scalar {
        /// Label used in error messages
        typename: &'static str,
        /// Membership test for the kind
        predicate: fn(&Value) -> bool,
    },
    /// Date value; validates by parse-ability and decodes to a date
    Date,
    /// Homogeneous sequence over an element checker
    ArrayOf(Box<Checker>),
    /// String-keyed mapping over a value checker
    DictOf(Box<Checker>),
    /// Named fields, each with its own required/optional rule
    Shape(HashMap<String, FieldRule>),
    /// Embedded or fetchable instance of a registered entity
    Reference {
        /// Lazily-resolved handle to the target entity
        target: EntityHandle,
        /// Decode strategy
        options: ReferenceOptions,
    },
}

impl Checker {
    /// Build a scalar checker from a type name and a predicate.
    pub fn scalar(typename: &'static str, predicate: fn(&Value) -> bool) -> Self {
        Self::Scalar {
            typename,
            predicate,
        }
    }

    /// Any-element sequence checker.
    pub fn array() -> Self {
        Self::scalar("array", Value::is_array)
    }

    /// Boolean checker.
    pub fn boolean() -> Self {
        Self::scalar("boolean", Value::is_boolean)
    }

    /// Number checker.
    pub fn number() -> Self {
        Self::scalar("number", Value::is_number)
    }

    /// String checker.
    pub fn string() -> Self {
        Self::scalar("string", Value::is_string)
    }

    /// Generic object checker.
    ///
    /// Intentionally loose: arrays also pass this check, mirroring a
    /// `typeof`-style membership test. Use [`Checker::dict_of`] or
    /// [`Checker::shape`] for strict keyed structures.
    pub fn object() -> Self {
        Self::scalar("object", |value| value.is_object() || value.is_array())
    }

    /// Date checker.
    pub fn date() -> Self {
        Self::Date
    }

    /// Sequence checker over an element checker.
    pub fn array_of(element: Checker) -> Self {
        Self::ArrayOf(Box::new(element))
    }

    /// Mapping checker over a value checker.
    pub fn dict_of(value: Checker) -> Self {
        Self::DictOf(Box::new(value))
    }

    /// Named-field checker over a nested schema.
    pub fn shape(fields: HashMap<String, FieldRule>) -> Self {
        Self::Shape(fields)
    }

    /// Reference checker targeting a registered entity.
    pub fn reference(target: EntityHandle, options: ReferenceOptions) -> Self {
        Self::Reference { target, options }
    }

    /// Returns the type label used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar { typename, .. } => typename,
            Self::Date => "date",
            Self::ArrayOf(_) => "array",
            Self::DictOf(_) => "dictionary",
            Self::Shape(_) => "shape",
            Self::Reference { target, .. } => target.name(),
        }
    }

    /// Whether decoding this checker produces entity instances.
    ///
    /// Containers propagate the flag from their element checker, so an
    /// array-of-reference (at any nesting depth) is entity-producing.
    pub fn entity_producing(&self) -> bool {
        match self {
            Self::Reference { .. } => true,
            Self::ArrayOf(inner) | Self::DictOf(inner) => inner.entity_producing(),
            _ => false,
        }
    }

    /// Whether this checker participates in the decode pass.
    ///
    /// Callers apply decode field-by-field only where this returns true;
    /// decode on any other checker yields nothing.
    pub fn decodes(&self) -> bool {
        match self {
            Self::Date | Self::Reference { .. } => true,
            Self::ArrayOf(inner) | Self::DictOf(inner) => inner.entity_producing(),
            _ => false,
        }
    }

    /// Wrap this checker as a required shape field.
    pub fn into_required(self) -> FieldRule {
        FieldRule::required(self)
    }

    /// Wrap this checker as an optional shape field.
    pub fn into_optional(self) -> FieldRule {
        FieldRule::optional(self)
    }
}

/// One field of a shape or entity schema: a checker plus the
/// required/optional entry point it should be invoked through.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// The field's checker
    pub checker: Checker,
    /// Whether an absent value is a failure
    pub required: bool,
}

impl FieldRule {
    /// Field that must be present.
    pub fn required(checker: Checker) -> Self {
        Self {
            checker,
            required: true,
        }
    }

    /// Field that may be absent.
    pub fn optional(checker: Checker) -> Self {
        Self {
            checker,
            required: false,
        }
    }

    /// Validate a field value through the rule's own entry point.
    pub fn validate(&self, value: Option<&Value>, field: &str) -> CheckResult<()> {
        if self.required {
            self.checker.validate_required(value, field)
        } else {
            self.checker.validate(value, field)
        }
    }
}
