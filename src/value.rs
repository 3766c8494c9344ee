//! The typed result model.
//!
//! [`Value`] is a closed tagged union; every consumption site matches
//! exhaustively so an unhandled kind is a compile error, not a silent
//! default. Coercions are total and never fail: an invalid conversion yields
//! a defined fallback value. The one exception is `Null`, whose coercions
//! return `None` (the "absent" sentinel) and whose ordering comparison is an
//! evaluation error.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::compiler::Solvable;
use crate::datetime;
use crate::error::EvaluationError;

/// A typed evaluation result.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value
    Null,

    /// Boolean
    Boolean(bool),

    /// Arbitrary-precision decimal number
    Number(Decimal),

    /// UTF-8 string
    String(String),

    /// A point in time (UTC instant)
    DateTime(DateTime<Utc>),

    /// A span of time
    Duration(Duration),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// String-keyed mapping, keys are case-sensitive
    Structure(HashMap<String, Value>),

    /// An argument passed to a lazy operator/function without being
    /// evaluated; the callee decides whether and when to solve it
    Lazy(Arc<Solvable>),
}

/// Integer-indexed element access (arrays, strings).
pub trait IndexedAccessor {
    /// Element at `index`, or `None` when out of range.
    fn get_index(&self, index: i64) -> Option<Value>;
}

/// String-keyed field access (structures, external objects).
pub trait KeyedAccessor {
    /// Field named `key`, or `None` when absent.
    fn get_key(&self, key: &str) -> Option<Value>;
}

impl IndexedAccessor for Vec<Value> {
    fn get_index(&self, index: i64) -> Option<Value> {
        usize::try_from(index).ok().and_then(|i| self.get(i).cloned())
    }
}

impl IndexedAccessor for String {
    fn get_index(&self, index: i64) -> Option<Value> {
        let index = usize::try_from(index).ok()?;
        self.chars()
            .nth(index)
            .map(|c| Value::String(c.to_string()))
    }
}

impl KeyedAccessor for HashMap<String, Value> {
    fn get_key(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl Value {
    /// Human-readable kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::DateTime(_) => "date-time",
            Value::Duration(_) => "duration",
            Value::Array(_) => "array",
            Value::Structure(_) => "structure",
            Value::Lazy(_) => "lazy",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Coerces to a number. `None` only for `Null`; anything unparseable
    /// falls back to zero.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Null => None,
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            Value::String(s) => Some(parse_decimal(s)),
            Value::DateTime(instant) => Some(Decimal::from(instant.timestamp_millis())),
            Value::Duration(duration) => Some(Decimal::from(duration.num_milliseconds())),
            Value::Array(_) | Value::Structure(_) | Value::Lazy(_) => Some(Decimal::ZERO),
        }
    }

    /// Coerces to a string. `None` only for `Null`.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Coerces to a boolean. `None` only for `Null`; numbers are true when
    /// nonzero, strings only when case-insensitively equal to `"true"`.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(!n.is_zero()),
            Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
            Value::DateTime(_)
            | Value::Duration(_)
            | Value::Array(_)
            | Value::Structure(_)
            | Value::Lazy(_) => Some(false),
        }
    }

    /// Coerces to an instant. Numbers are epoch milliseconds; strings parse
    /// as RFC 3339, falling back to the epoch sentinel.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Null => None,
            Value::DateTime(instant) => Some(*instant),
            Value::Number(n) => Some(datetime::instant_from_millis(
                n.to_i64().unwrap_or_default(),
            )),
            Value::String(s) => Some(
                DateTime::parse_from_rfc3339(s.trim())
                    .map(|zoned| zoned.with_timezone(&Utc))
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            ),
            _ => Some(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    /// Coerces to a duration. Numbers are milliseconds; strings parse as
    /// ISO-8601 durations, falling back to the zero-duration sentinel.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Null => None,
            Value::Duration(duration) => Some(*duration),
            Value::Number(n) => Some(Duration::milliseconds(n.to_i64().unwrap_or_default())),
            Value::String(s) => Some(datetime::parse_duration(s).unwrap_or(Duration::zero())),
            _ => Some(Duration::zero()),
        }
    }

    /// Coerces to an array; scalars become a single-element array.
    pub fn as_array(&self) -> Option<Vec<Value>> {
        match self {
            Value::Null => None,
            Value::Array(items) => Some(items.clone()),
            other => Some(vec![other.clone()]),
        }
    }

    /// Coerces to a structure; non-structures yield an empty mapping.
    pub fn as_structure(&self) -> Option<HashMap<String, Value>> {
        match self {
            Value::Null => None,
            Value::Structure(fields) => Some(fields.clone()),
            _ => Some(HashMap::new()),
        }
    }

    /// Solves a lazy thunk against the context; any other kind passes
    /// through unchanged.
    pub fn solved(
        &self,
        context: &crate::context::EvaluationContext,
    ) -> Result<Value, EvaluationError> {
        match self {
            Value::Lazy(solvable) => solvable.solve(context),
            other => Ok(other.clone()),
        }
    }

    /// The indexed-access capability, where the kind supports it.
    pub fn indexed_accessor(&self) -> Option<&dyn IndexedAccessor> {
        match self {
            Value::Array(items) => Some(items),
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The keyed-access capability, where the kind supports it.
    pub fn keyed_accessor(&self) -> Option<&dyn KeyedAccessor> {
        match self {
            Value::Structure(fields) => Some(fields),
            _ => None,
        }
    }

    /// Orders two values, driven by the kind of the left-hand side. Numbers
    /// compare by decimal value regardless of scale; comparison against
    /// `Null` on either side is an error. Arrays and structures have no
    /// ordering, only structural equality.
    pub fn compare(&self, other: &Value, position: usize) -> Result<Ordering, EvaluationError> {
        if self.is_null() || other.is_null() {
            return Err(EvaluationError::NullComparison { position });
        }
        match self {
            Value::Number(left) => {
                // other is non-null, so coercion cannot be absent
                let right = other.as_number().unwrap_or_default();
                Ok(left.cmp(&right))
            }
            Value::Boolean(_) => {
                let left = self.as_number().unwrap_or_default();
                let right = other.as_number().unwrap_or_default();
                Ok(left.cmp(&right))
            }
            Value::DateTime(left) => {
                let right = other.as_datetime().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                Ok(left.cmp(&right))
            }
            Value::Duration(left) => {
                let right = other.as_duration().unwrap_or(Duration::zero());
                Ok(left.cmp(&right))
            }
            Value::Array(_) | Value::Structure(_) => Err(EvaluationError::UnsupportedDataType {
                position,
                message: format!("cannot order values of type {}", self.type_name()),
            }),
            _ => {
                let left = self.as_string().unwrap_or_default();
                let right = other.as_string().unwrap_or_default();
                Ok(left.cmp(&right))
            }
        }
    }

    /// Converts a JSON document into a value tree. Numbers become decimals,
    /// objects become structures (entry-by-entry), arrays recurse.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                let decimal = n
                    .as_i64()
                    .map(Decimal::from)
                    .or_else(|| n.as_u64().map(Decimal::from))
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .unwrap_or_default();
                Value::Number(decimal)
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Structure(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON for debug output. Lazy thunks render as
    /// null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Lazy(_) => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(n.to_f64().unwrap_or_default())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(instant) => serde_json::Value::String(instant.to_rfc3339()),
            Value::Duration(duration) => serde_json::Value::String(duration.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Structure(fields) => {
                let mut map = serde_json::Map::new();
                let mut keys: Vec<_> = fields.keys().collect();
                keys.sort();
                for key in keys {
                    map.insert(key.clone(), fields[key].to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

fn parse_decimal(text: &str) -> Decimal {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Decimal::ONE;
    }
    if text.eq_ignore_ascii_case("false") {
        return Decimal::ZERO;
    }
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .unwrap_or_default()
}

// Equality is structural; numbers compare by value regardless of scale, so
// 70 == 70.0. Lazy thunks are equal only when they are the same thunk.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Structure(a), Value::Structure(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(instant) => write!(f, "{}", instant.to_rfc3339()),
            Value::Duration(duration) => write!(f, "{}", duration),
            Value::Array(_) | Value::Structure(_) => write!(f, "{}", self.to_json()),
            Value::Lazy(_) => write!(f, "<lazy>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Decimal::from_f64(n).unwrap_or_default())
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(instant: DateTime<Utc>) -> Self {
        Value::DateTime(instant)
    }
}

impl From<Duration> for Value {
    fn from(duration: Duration) -> Self {
        Value::Duration(duration)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(fields: HashMap<String, T>) -> Self {
        Value::Structure(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_numeric_scale() {
        let a = Value::Number("70".parse().unwrap());
        let b = Value::Number("70.0".parse().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_string_to_number_fallbacks() {
        assert_eq!(
            Value::String("true".to_string()).as_number(),
            Some(Decimal::ONE)
        );
        assert_eq!(
            Value::String("not a number".to_string()).as_number(),
            Some(Decimal::ZERO)
        );
        assert_eq!(
            Value::String("1.5e3".to_string()).as_number(),
            Some("1500".parse().unwrap())
        );
    }

    #[test]
    fn test_null_coercions_are_absent() {
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::Null.as_string(), None);
        assert_eq!(Value::Null.as_boolean(), None);
        assert_eq!(Value::Null.as_datetime(), None);
        assert_eq!(Value::Null.as_duration(), None);
        assert_eq!(Value::Null.as_array(), None);
        assert_eq!(Value::Null.as_structure(), None);
    }

    #[test]
    fn test_null_comparison_fails() {
        let err = Value::Null.compare(&Value::from(1), 7).unwrap_err();
        assert_eq!(err, EvaluationError::NullComparison { position: 7 });
    }

    #[test]
    fn test_string_to_boolean_is_literal_true_only() {
        assert_eq!(Value::from("TRUE").as_boolean(), Some(true));
        assert_eq!(Value::from("1").as_boolean(), Some(false));
        assert_eq!(Value::from("yes").as_boolean(), Some(false));
    }

    #[test]
    fn test_number_datetime_round_trip() {
        let millis = Value::from(86_400_000i64);
        let instant = millis.as_datetime().unwrap();
        assert_eq!(instant.to_rfc3339(), "1970-01-02T00:00:00+00:00");
        assert_eq!(
            Value::DateTime(instant).as_number(),
            Some(Decimal::from(86_400_000i64))
        );
    }

    #[test]
    fn test_indexed_accessor_on_string() {
        let s = Value::from("abc");
        let accessor = s.indexed_accessor().unwrap();
        assert_eq!(accessor.get_index(1), Some(Value::from("b")));
        assert_eq!(accessor.get_index(5), None);
        assert_eq!(accessor.get_index(-1), None);
    }

    #[test]
    fn test_from_json_nested() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": [1, 2.5], "b": {"c": true}}"#).unwrap();
        let value = Value::from_json(&json);
        let Value::Structure(fields) = &value else {
            panic!("expected structure");
        };
        assert_eq!(
            fields["a"],
            Value::Array(vec![Value::from(1), Value::from(2.5)])
        );
    }
}
