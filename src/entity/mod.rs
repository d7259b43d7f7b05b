//! Entity subsystem for shapecheck
//!
//! External contracts the decoding engine calls into: entity types are
//! constructible from a raw payload, self-validating against their own
//! declared field rules, and addressable by identifier through an
//! async-capable lookup. The registry provides deferred binding so
//! entities and the reference checkers that target them can be defined
//! in any order.

mod binding;
mod registry;

pub use binding::{Entity, EntityBinding, ID_FIELD};
pub use registry::{EntityHandle, EntityRegistry};
