//! Validation pass over raw values
//!
//! Validation semantics:
//! - Absent means missing or null; the optional entry point passes
//!   silently, the required entry point fails
//! - Present values must match the checker's kind exactly
//! - Composite checkers recurse with qualified field names and raise the
//!   first failure (fail-fast, no aggregation)
//! - Validation never mutates input and holds no per-call state

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::entity::ID_FIELD;

use super::errors::{CheckError, CheckResult};
use super::types::{Checker, FieldRule};

impl Checker {
    /// Validates a value, passing silently when it is absent.
    ///
    /// Absent covers both a missing field (`None`) and an explicit null.
    ///
    /// # Errors
    ///
    /// Returns `CheckError` when a present value does not match this
    /// checker's kind, naming `field` and the expected type.
    pub fn validate(&self, value: Option<&Value>, field: &str) -> CheckResult<()> {
        self.check(value, field, false)
    }

    /// Validates a value, treating an absent value as a failure.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::RequiredMissing` when the value is absent,
    /// otherwise behaves exactly like [`Checker::validate`].
    pub fn validate_required(&self, value: Option<&Value>, field: &str) -> CheckResult<()> {
        self.check(value, field, true)
    }

    /// Shared validation core behind both entry points.
    fn check(&self, value: Option<&Value>, field: &str, required: bool) -> CheckResult<()> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            if required {
                return Err(CheckError::required(field));
            }
            return Ok(());
        };

        match self {
            Checker::Scalar {
                typename,
                predicate,
            } => {
                if predicate(value) {
                    Ok(())
                } else {
                    Err(CheckError::mismatch(field, *typename, value))
                }
            }
            Checker::Date => {
                if parse_date(value).is_some() {
                    Ok(())
                } else {
                    Err(CheckError::mismatch(field, "date", value))
                }
            }
            Checker::ArrayOf(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| CheckError::not_array(field, value))?;
                for (index, item) in items.iter().enumerate() {
                    // Elements always go through the optional entry point;
                    // null elements pass like any other absent value.
                    element.validate(Some(item), &format!("{}[{}]", field, index))?;
                }
                Ok(())
            }
            Checker::DictOf(entry) => {
                let map = value
                    .as_object()
                    .ok_or_else(|| CheckError::not_dictionary(field, value))?;
                for (key, item) in map {
                    entry.validate(Some(item), &make_path(field, key))?;
                }
                Ok(())
            }
            Checker::Shape(fields) => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| CheckError::mismatch(field, "object", value))?;
                validate_fields(fields, obj, field)
            }
            Checker::Reference { target, .. } => {
                // The value is assumed to be an embedded instance of the
                // target entity; delegate to its own self-validation.
                let binding = target.resolve()?;
                binding.validate_instance(value, field)
            }
        }
    }
}

/// Fans a raw object out over field rules, each through its own
/// required/optional entry point. Shared by the shape composite and
/// entity self-validation.
pub(crate) fn validate_fields(
    fields: &std::collections::HashMap<String, FieldRule>,
    obj: &Map<String, Value>,
    prefix: &str,
) -> CheckResult<()> {
    for (name, rule) in fields {
        rule.validate(obj.get(name), &make_path(prefix, name))?;
    }
    Ok(())
}

/// Parses a raw date value: RFC 3339 string or millisecond timestamp.
pub(crate) fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Extracts the identifier a raw entity payload carries, if any.
pub(crate) fn raw_identifier(raw: &Value) -> Option<&str> {
    raw.get(ID_FIELD).and_then(Value::as_str)
}

/// Creates a field path from prefix and field name.
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_scalar_kinds_accept_their_values() {
        assert!(Checker::string().validate(Some(&json!("x")), "f").is_ok());
        assert!(Checker::number().validate(Some(&json!(1.5)), "f").is_ok());
        assert!(Checker::boolean().validate(Some(&json!(true)), "f").is_ok());
        assert!(Checker::array().validate(Some(&json!([1, "a"])), "f").is_ok());
    }

    #[test]
    fn test_scalar_mismatch_names_field_and_type() {
        let err = Checker::string()
            .validate(Some(&json!(3)), "title")
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("title is not string"));
    }

    #[test]
    fn test_absent_passes_optional_fails_required() {
        for checker in [
            Checker::string(),
            Checker::date(),
            Checker::array_of(Checker::number()),
            Checker::dict_of(Checker::number()),
            Checker::shape(HashMap::new()),
        ] {
            assert!(checker.validate(None, "f").is_ok());
            assert!(checker.validate(Some(&json!(null)), "f").is_ok());

            let err = checker.validate_required(None, "f").unwrap_err();
            assert!(format!("{}", err).contains("required"));
            let err = checker.validate_required(Some(&json!(null)), "f").unwrap_err();
            assert_eq!(err, CheckError::required("f"));
        }
    }

    #[test]
    fn test_date_accepts_rfc3339_and_millis() {
        let checker = Checker::date();
        assert!(checker
            .validate(Some(&json!("2024-03-01T12:00:00Z")), "at")
            .is_ok());
        assert!(checker.validate(Some(&json!(1709294400000i64)), "at").is_ok());
    }

    #[test]
    fn test_date_rejects_other_values_citing_actual_type() {
        let err = Checker::date()
            .validate(Some(&json!(true)), "at")
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("at is not date"));
        assert!(msg.contains("boolean"));
    }

    #[test]
    fn test_array_of_checks_every_element() {
        let checker = Checker::array_of(Checker::string());
        assert!(checker
            .validate(Some(&json!(["rust", "schema"])), "tags")
            .is_ok());

        let err = checker
            .validate(Some(&json!(["rust", 7, "db"])), "tags")
            .unwrap_err();
        assert!(format!("{}", err).contains("tags[1]"));
    }

    #[test]
    fn test_array_of_rejects_non_sequence() {
        let err = Checker::array_of(Checker::string())
            .validate(Some(&json!("nope")), "tags")
            .unwrap_err();
        assert!(matches!(err, CheckError::NotAnArray { .. }));
    }

    #[test]
    fn test_array_null_elements_pass_optional_check() {
        let checker = Checker::array_of(Checker::string());
        assert!(checker.validate(Some(&json!(["a", null])), "tags").is_ok());
    }

    #[test]
    fn test_dict_of_cites_offending_key() {
        let checker = Checker::dict_of(Checker::string());
        let err = checker
            .validate(Some(&json!({"a": "x", "b": 1})), "m")
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("m.b"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn test_dict_of_rejects_non_object_citing_type() {
        let err = Checker::dict_of(Checker::string())
            .validate(Some(&json!([1, 2])), "m")
            .unwrap_err();
        assert_eq!(
            err,
            CheckError::NotADictionary {
                field: "m".into(),
                actual: "array".into(),
            }
        );
    }

    #[test]
    fn test_shape_fans_out_field_rules() {
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), Checker::number().into_required());
        fields.insert("y".to_string(), Checker::number().into_optional());
        let checker = Checker::shape(fields);

        assert!(checker.validate(Some(&json!({"x": 1})), "pt").is_ok());

        let err = checker.validate(Some(&json!({})), "pt").unwrap_err();
        assert_eq!(err, CheckError::required("pt.x"));
    }

    #[test]
    fn test_shape_ignores_undeclared_fields() {
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), Checker::number().into_required());
        let checker = Checker::shape(fields);

        // The shape only fans out declared fields; extras are not its rule.
        assert!(checker
            .validate(Some(&json!({"x": 1, "extra": "ok"})), "pt")
            .is_ok());
    }

    #[test]
    fn test_nested_shape_paths_are_qualified() {
        let mut inner = HashMap::new();
        inner.insert("city".to_string(), Checker::string().into_required());
        let mut fields = HashMap::new();
        fields.insert(
            "address".to_string(),
            Checker::shape(inner).into_required(),
        );
        let checker = Checker::shape(fields);

        let err = checker
            .validate(Some(&json!({"address": {}})), "user")
            .unwrap_err();
        assert_eq!(err, CheckError::required("user.address.city"));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let checker = Checker::array_of(Checker::number());
        let doc = json!([1, 2, "x"]);
        let first = checker.validate(Some(&doc), "vals").unwrap_err();
        for _ in 0..50 {
            assert_eq!(checker.validate(Some(&doc), "vals").unwrap_err(), first);
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage_string() {
        assert!(parse_date(&json!("not a date")).is_none());
    }
}
