//! Entity contracts consumed by reference checkers
//!
//! An entity is a constructible, self-validating, identifier-addressable
//! record type. Reference checkers never learn a target's field list;
//! they delegate to the capabilities declared here.

use std::any::Any;
use std::collections::HashMap;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::checker::{validate_fields, CheckError, CheckResult, FieldRule};

/// Well-known field name under which raw entity payloads carry their
/// identifier. Eager decode treats its absence as "no reference".
pub const ID_FIELD: &str = "_id";

/// A decoded entity instance, type-erased for transport through the
/// decode pass. Downcast with [`crate::checker::Decoded::into_entity`].
pub trait Entity: Send + Sync {
    /// Borrowed view for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Owned conversion for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// The capabilities an entity type exposes to the schema layer.
///
/// One binding per entity type, registered once in an
/// [`crate::entity::EntityRegistry`] and shared behind an `Arc`.
pub trait EntityBinding: Send + Sync {
    /// The entity's registered name.
    fn name(&self) -> &str;

    /// The entity's own declared field rules.
    fn fields(&self) -> &HashMap<String, FieldRule>;

    /// Construct a fresh instance seeded from a raw payload, applying
    /// each field's own decode where declared. Used by non-eager
    /// reference decode; performs no IO.
    fn construct(&self, raw: &Value) -> Box<dyn Entity>;

    /// Look up the canonical record by identifier. Used by eager
    /// reference decode; may be backed by storage or the network.
    /// Synchronous resolvers return a ready future.
    fn find(&self, id: &str) -> BoxFuture<'static, Option<Box<dyn Entity>>>;

    /// Validate a raw embedded payload against this entity's own
    /// declared field rules.
    ///
    /// This is the self-validation capability reference checkers call;
    /// it reuses the same field fan-out as the shape composite rather
    /// than reimplementing it.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::NestedValidationFailure` wrapping the first
    /// failing field, or a type mismatch if the payload is not an object.
    fn validate_instance(&self, raw: &Value, field: &str) -> CheckResult<()> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CheckError::mismatch(field, "object", raw))?;
        validate_fields(self.fields(), obj, field)
            .map_err(|source| CheckError::nested(field, self.name(), source))
    }
}
