//! Checker subsystem for shapecheck
//!
//! A checker is a composable validator (and, for entity-wrapping kinds,
//! a decoder) for one field's expected shape.
//!
//! # Design Principles
//!
//! - Checkers are immutable once built and hold no per-call state
//! - Required/optional are two entry points over one validation core
//! - Validation is synchronous, pure, and fail-fast
//! - Decoding is a separate optional pass; only date and reference
//!   checkers (and containers over them) participate
//! - The eager-reference lookup is the sole suspension point

mod decode;
mod errors;
mod types;
mod validate;

pub use decode::Decoded;
pub use errors::{CheckError, CheckResult};
pub use types::{Checker, FieldRule, ReferenceOptions};

pub(crate) use validate::validate_fields;
