//! Decode pass: raw values into typed instances
//!
//! Decoding is a separate, optional second pass applied field-by-field
//! after (or independently of) validation, and only to checkers that
//! report [`Checker::decodes`]. It is synchronous everywhere except the
//! eager-reference path, which delegates to an async-capable external
//! lookup; [`Checker::decode`] is the synchronous surface and
//! [`Checker::decode_async`] the deferred-capable one.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde_json::Value;

use crate::entity::Entity;

use super::errors::{CheckError, CheckResult};
use super::types::Checker;
use super::validate::{parse_date, raw_identifier};

/// Path label used in decode errors, which carry no caller field name.
const VALUE_PATH: &str = "$value";

/// A decoded value produced by the decode pass.
///
/// Container entries are `Option` because an eager lookup may legitimately
/// produce nothing (absent identifier, or a miss from the external
/// resolver); ordering and key identity of the raw input are preserved.
pub enum Decoded {
    /// Decoded date value
    Date(DateTime<Utc>),
    /// Decoded entity instance
    Entity(Box<dyn Entity>),
    /// Decoded sequence, input order preserved
    List(Vec<Option<Decoded>>),
    /// Decoded mapping, key identity preserved
    Map(HashMap<String, Option<Decoded>>),
}

impl Decoded {
    /// Returns the date value, if this is a decoded date.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// Downcasts a decoded entity to its concrete type.
    pub fn into_entity<T: 'static>(self) -> Option<Box<T>> {
        match self {
            Self::Entity(entity) => entity.into_any().downcast().ok(),
            _ => None,
        }
    }

    /// Returns the decoded sequence, if this is a list.
    pub fn into_list(self) -> Option<Vec<Option<Decoded>>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the decoded mapping, if this is a map.
    pub fn into_map(self) -> Option<HashMap<String, Option<Decoded>>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => f.debug_tuple("Date").field(date).finish(),
            Self::Entity(_) => f.write_str("Entity(..)"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

impl Checker {
    /// Synchronous decode of a raw value.
    ///
    /// Absent raw input never fails: dates and references yield `None`,
    /// containers yield an empty sequence or mapping. Checkers that do
    /// not participate in decoding (see [`Checker::decodes`]) yield
    /// `None` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::DeferredLookup` if an eager reference on the
    /// path actually needs its external lookup; use
    /// [`Checker::decode_async`] for that case. Other errors mirror
    /// validation (malformed date, wrong container kind).
    pub fn decode(&self, raw: Option<&Value>) -> CheckResult<Option<Decoded>> {
        let raw = raw.filter(|v| !v.is_null());
        match self {
            Checker::Date => match raw {
                None => Ok(None),
                Some(value) => parse_date(value)
                    .map(|date| Some(Decoded::Date(date)))
                    .ok_or_else(|| CheckError::mismatch(VALUE_PATH, "date", value)),
            },
            Checker::Reference { target, options } => {
                let Some(value) = raw else {
                    return Ok(None);
                };
                if options.eager {
                    // Only an actual lookup forces the async surface; a
                    // payload without an identifier is simply no reference.
                    if raw_identifier(value).is_some() {
                        Err(CheckError::deferred(VALUE_PATH))
                    } else {
                        Ok(None)
                    }
                } else {
                    let binding = target.resolve()?;
                    Ok(Some(Decoded::Entity(binding.construct(value))))
                }
            }
            Checker::ArrayOf(element) if element.entity_producing() => {
                let Some(value) = raw else {
                    return Ok(Some(Decoded::List(Vec::new())));
                };
                let items = value
                    .as_array()
                    .ok_or_else(|| CheckError::not_array(VALUE_PATH, value))?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(element.decode(Some(item))?);
                }
                Ok(Some(Decoded::List(out)))
            }
            Checker::DictOf(entry) if entry.entity_producing() => {
                let Some(value) = raw else {
                    return Ok(Some(Decoded::Map(HashMap::new())));
                };
                let map = value
                    .as_object()
                    .ok_or_else(|| CheckError::not_dictionary(VALUE_PATH, value))?;
                let mut out = HashMap::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), entry.decode(Some(item))?);
                }
                Ok(Some(Decoded::Map(out)))
            }
            _ => Ok(None),
        }
    }

    /// Async-capable decode covering every path, eager lookups included.
    ///
    /// Composite checkers decode their elements concurrently and resolve
    /// to a single aggregate once every element has completed, preserving
    /// input order for sequences and key identity for mappings.
    pub fn decode_async<'a>(
        &'a self,
        raw: Option<&'a Value>,
    ) -> BoxFuture<'a, CheckResult<Option<Decoded>>> {
        async move {
            let raw = raw.filter(|v| !v.is_null());
            match self {
                Checker::Reference { target, options } if options.eager => {
                    let Some(value) = raw else {
                        return Ok(None);
                    };
                    let Some(id) = raw_identifier(value) else {
                        return Ok(None);
                    };
                    let binding = target.resolve()?;
                    Ok(binding.find(id).await.map(Decoded::Entity))
                }
                Checker::ArrayOf(element) if element.entity_producing() => {
                    let Some(value) = raw else {
                        return Ok(Some(Decoded::List(Vec::new())));
                    };
                    let items = value
                        .as_array()
                        .ok_or_else(|| CheckError::not_array(VALUE_PATH, value))?;
                    let results =
                        join_all(items.iter().map(|item| element.decode_async(Some(item)))).await;
                    let mut out = Vec::with_capacity(results.len());
                    for result in results {
                        out.push(result?);
                    }
                    Ok(Some(Decoded::List(out)))
                }
                Checker::DictOf(entry) if entry.entity_producing() => {
                    let Some(value) = raw else {
                        return Ok(Some(Decoded::Map(HashMap::new())));
                    };
                    let map = value
                        .as_object()
                        .ok_or_else(|| CheckError::not_dictionary(VALUE_PATH, value))?;
                    let keys: Vec<&String> = map.keys().collect();
                    let results =
                        join_all(map.values().map(|item| entry.decode_async(Some(item)))).await;
                    let mut out = HashMap::with_capacity(keys.len());
                    for (key, result) in keys.into_iter().zip(results) {
                        out.insert(key.clone(), result?);
                    }
                    Ok(Some(Decoded::Map(out)))
                }
                _ => self.decode(raw),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use serde_json::json;

    #[test]
    fn test_date_decode_from_string_and_millis() {
        let checker = Checker::date();
        let decoded = checker
            .decode(Some(&json!("2024-03-01T12:00:00Z")))
            .unwrap()
            .unwrap();
        let date = decoded.as_date().unwrap();
        assert_eq!(date.timestamp_millis(), 1709294400000);

        let decoded = checker.decode(Some(&json!(1709294400000i64))).unwrap().unwrap();
        assert_eq!(decoded.as_date().unwrap(), date);
    }

    #[test]
    fn test_date_decode_absent_yields_nothing() {
        assert!(Checker::date().decode(None).unwrap().is_none());
        assert!(Checker::date().decode(Some(&json!(null))).unwrap().is_none());
    }

    #[test]
    fn test_date_decode_rejects_unparseable() {
        let err = Checker::date().decode(Some(&json!("yesterday"))).unwrap_err();
        assert!(matches!(err, CheckError::TypeMismatch { .. }));
    }

    #[test]
    fn test_non_decoding_checkers_yield_nothing() {
        assert!(Checker::string().decode(Some(&json!("x"))).unwrap().is_none());
        assert!(Checker::array_of(Checker::number())
            .decode(Some(&json!([1])))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_array_of_date_does_not_propagate_decode() {
        // Only entity-producing elements make a container decode.
        let checker = Checker::array_of(Checker::date());
        assert!(!checker.decodes());
        assert!(checker
            .decode(Some(&json!(["2024-03-01T12:00:00Z"])))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decoded_debug_is_total() {
        let decoded = Decoded::List(vec![None, Some(Decoded::Date(Utc::now()))]);
        assert!(format!("{:?}", decoded).contains("List"));
    }
}
