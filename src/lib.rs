//! shapecheck - a composable schema validation and decoding engine
//!
//! Checkers describe the expected shape of one field of a raw record,
//! validate untyped input against that shape, and - where the checker
//! wraps a constructible or fetchable entity - decode raw input into a
//! typed instance, recursively following nested and referenced entities.

pub mod checker;
pub mod entity;
