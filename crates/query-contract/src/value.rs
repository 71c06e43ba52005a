//! Raw input handling and scalar coercion.
//!
//! Raw request input is a flat JSON map (`serde_json::Map`) from wire key to a
//! string, a list of strings, or an already-typed JSON value. Query-string
//! layers usually hand over strings only, so every coercion here accepts the
//! string spelling of its target type too.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::operator::ValueKind;

/// Raw, untyped request parameters.
pub type RawParams = Map<String, Value>;

/// Build raw parameters from decoded query-string pairs.
///
/// Repeated keys are folded into a JSON array in arrival order, so
/// `status_in=a&status_in=b` becomes `{"status_in": ["a", "b"]}`.
pub fn from_pairs<I, K, V>(pairs: I) -> RawParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut params = RawParams::new();
    for (key, value) in pairs {
        let key = key.into();
        let value = Value::String(value.into());
        match params.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(key, value);
            }
        }
    }
    params
}

/// A typed scalar produced by coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Date(DateTime<Utc>),
    String(String),
}

impl Scalar {
    /// String contents, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an integer scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float, for integer and float scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Parse a string that carries embedded JSON (`"[10,50]"`, `"{\"from\":1}"`).
///
/// Values that are not strings, or strings that do not look like a JSON array
/// or object, are returned unchanged.
pub(crate) fn parse_embedded(value: &Value) -> Cow<'_, Value> {
    if let Value::String(s) = value {
        let trimmed = s.trim();
        if (trimmed.starts_with('[') || trimmed.starts_with('{'))
            && let Ok(parsed) = serde_json::from_str::<Value>(trimmed)
        {
            return Cow::Owned(parsed);
        }
    }
    Cow::Borrowed(value)
}

/// Short description of a JSON value's type for error messages.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn whole(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Coerce a raw value to a whole number. `10.0` and `"10.0"` are both 10.
pub(crate) fn coerce_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole))
            .ok_or_else(|| format!("expected an integer, got {n}")),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole))
                .ok_or_else(|| format!("expected an integer, got '{s}'"))
        }
        other => Err(format!("expected an integer, got {}", describe(other))),
    }
}

/// Coerce a raw value to a boolean.
pub(crate) fn coerce_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("expected a boolean, got {n}")),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("expected a boolean, got '{s}'")),
        },
        other => Err(format!("expected a boolean, got {}", describe(other))),
    }
}

/// Coerce a raw value to a string; numbers and booleans are stringified.
pub(crate) fn coerce_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {}", describe(other))),
    }
}

fn coerce_number(value: &Value) -> Result<Scalar, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Integer(i))
            } else {
                n.as_f64()
                    .map(Scalar::Float)
                    .ok_or_else(|| format!("expected a number, got {n}"))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Scalar::Integer(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Scalar::Float(f)),
                _ => Err(format!("expected a number, got '{s}'")),
            }
        }
        other => Err(format!("expected a number, got {}", describe(other))),
    }
}

fn coerce_date(value: &Value) -> Result<Scalar, String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(Scalar::Date(ts.with_timezone(&Utc)));
            }
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Scalar::Date(dt.and_utc()))
                .ok_or_else(|| format!("expected an RFC 3339 timestamp or YYYY-MM-DD date, got '{s}'"))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(Scalar::Date)
            .ok_or_else(|| format!("expected a Unix timestamp in seconds, got {n}")),
        other => Err(format!("expected a date, got {}", describe(other))),
    }
}

/// Coerce a raw value to a scalar of the given kind.
pub(crate) fn coerce_scalar(kind: &ValueKind, value: &Value) -> Result<Scalar, String> {
    match kind {
        ValueKind::String => coerce_text(value).map(Scalar::String),
        ValueKind::Number => coerce_number(value),
        ValueKind::Boolean => coerce_bool(value).map(Scalar::Bool),
        ValueKind::Date => coerce_date(value),
        ValueKind::Enum(allowed) => {
            let text = coerce_text(value)?;
            if allowed.iter().any(|v| v == &text) {
                Ok(Scalar::String(text))
            } else {
                Err(format!(
                    "'{text}' is not one of: {}",
                    allowed.join(", ")
                ))
            }
        }
        ValueKind::Array => match value {
            Value::String(s) => Ok(Scalar::String(s.clone())),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(_) => coerce_number(value),
            other => Err(format!("expected a scalar element, got {}", describe(other))),
        },
    }
}

/// Split a raw value into list items.
///
/// Accepts a JSON array, a string carrying a JSON array, a comma-separated
/// string, or a single scalar (a one-element list).
pub(crate) fn as_list(value: &Value) -> Result<Vec<Value>, String> {
    let items = match parse_embedded(value).as_ref() {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Value::String(part.to_string()))
            .collect(),
        scalar @ (Value::Number(_) | Value::Bool(_)) => vec![scalar.clone()],
        other => return Err(format!("expected a list, got {}", describe(other))),
    };

    if items.is_empty() {
        return Err("expected a non-empty list".to_string());
    }
    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_pairs_folds_repeated_keys() {
        let params = from_pairs([
            ("status_in", "active"),
            ("status_in", "pending"),
            ("status_in", "archived"),
            ("limit", "20"),
        ]);
        assert_eq!(params["status_in"], json!(["active", "pending", "archived"]));
        assert_eq!(params["limit"], json!("20"));
    }

    #[test]
    fn integers_from_strings_and_numbers() {
        assert_eq!(coerce_integer(&json!("42")), Ok(42));
        assert_eq!(coerce_integer(&json!(" 7 ")), Ok(7));
        assert_eq!(coerce_integer(&json!(12)), Ok(12));
        assert_eq!(coerce_integer(&json!(3.0)), Ok(3));
        assert!(coerce_integer(&json!("ten")).is_err());
        assert!(coerce_integer(&json!(2.5)).is_err());
        assert!(coerce_integer(&json!([1])).is_err());
    }

    #[test]
    fn whole_number_strings_match_native_numbers() {
        assert_eq!(coerce_integer(&json!("10.0")), coerce_integer(&json!(10.0)));
        assert_eq!(coerce_integer(&json!(" 10.0 ")), Ok(10));
        assert!(coerce_integer(&json!("2.5")).is_err());
        assert!(coerce_integer(&json!("NaN")).is_err());
        assert!(coerce_integer(&json!("inf")).is_err());
    }

    #[test]
    fn numbers_keep_integers_integral() {
        assert_eq!(
            coerce_scalar(&ValueKind::Number, &json!("10")),
            Ok(Scalar::Integer(10))
        );
        assert_eq!(
            coerce_scalar(&ValueKind::Number, &json!("10.5")),
            Ok(Scalar::Float(10.5))
        );
        assert!(coerce_scalar(&ValueKind::Number, &json!("NaN")).is_err());
        assert!(coerce_scalar(&ValueKind::Number, &json!(true)).is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(coerce_bool(&json!("TRUE")), Ok(true));
        assert_eq!(coerce_bool(&json!("0")), Ok(false));
        assert_eq!(coerce_bool(&json!(1)), Ok(true));
        assert!(coerce_bool(&json!("yes")).is_err());
    }

    #[test]
    fn dates_accept_three_spellings() {
        let rfc = coerce_scalar(&ValueKind::Date, &json!("2024-03-01T12:00:00+02:00")).unwrap();
        let Scalar::Date(rfc) = rfc else {
            panic!("expected date, got {rfc:?}");
        };
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let day = coerce_scalar(&ValueKind::Date, &json!("2024-03-01")).unwrap();
        assert!(matches!(day, Scalar::Date(d) if d.timestamp() == 1_709_251_200));

        let unix = coerce_scalar(&ValueKind::Date, &json!(0)).unwrap();
        assert!(matches!(unix, Scalar::Date(d) if d.timestamp() == 0));

        assert!(coerce_scalar(&ValueKind::Date, &json!("March 1st")).is_err());
    }

    #[test]
    fn enums_reject_non_members() {
        let kind = ValueKind::Enum(vec!["draft".to_string(), "live".to_string()]);
        assert_eq!(coerce_scalar(&kind, &json!("live")), Ok(Scalar::from("live")));
        let err = coerce_scalar(&kind, &json!("gone")).unwrap_err();
        assert!(err.contains("draft, live"), "{err}");
    }

    #[test]
    fn lists_from_every_spelling() {
        assert_eq!(as_list(&json!(["a", "b"])).unwrap().len(), 2);
        assert_eq!(as_list(&json!("[1, 2, 3]")).unwrap(), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(
            as_list(&json!("active, pending")).unwrap(),
            vec![json!("active"), json!("pending")]
        );
        assert_eq!(as_list(&json!(5)).unwrap(), vec![json!(5)]);
        assert!(as_list(&json!([])).is_err());
        assert!(as_list(&json!({"a": 1})).is_err());
    }

    #[test]
    fn embedded_json_only_for_brackets() {
        assert_eq!(parse_embedded(&json!("[10,50]")).into_owned(), json!([10, 50]));
        assert_eq!(parse_embedded(&json!("plain")).into_owned(), json!("plain"));
        assert_eq!(parse_embedded(&json!("[broken")).into_owned(), json!("[broken"));
    }

    #[test]
    fn scalar_serializes_untagged() {
        let values = vec![Scalar::Integer(10), Scalar::from("x"), Scalar::Null];
        assert_eq!(serde_json::to_value(&values).unwrap(), json!([10, "x", null]));
    }
}
