//! Operator registry.
//!
//! Static tables mapping a field's [`ValueKind`] to its default and legal
//! operator sets, and each [`FilterOperator`] to the [`ValueShape`] its value
//! must take on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of value a filterable field holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp, calendar date, or Unix seconds.
    Date,
    /// One of a closed set of string values.
    Enum(Vec<String>),
    /// Multi-valued field; elements are untyped scalars.
    Array,
}

impl ValueKind {
    /// Short name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Enum(_) => "enum",
            ValueKind::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison operators for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    StartsWith,
    EndsWith,
    Contains,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    Regex,
}

impl FilterOperator {
    /// Every operator, in declaration order.
    pub const ALL: [FilterOperator; 17] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Like,
        FilterOperator::Ilike,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Contains,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
        FilterOperator::Regex,
    ];

    /// Wire token, used as the `<field>_<token>` suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::Ilike => "ilike",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Contains => "contains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Between => "between",
            FilterOperator::IsNull => "isNull",
            FilterOperator::IsNotNull => "isNotNull",
            FilterOperator::Regex => "regex",
        }
    }

    /// Wire key for this operator on `field`. `eq` uses the bare field name.
    pub fn wire_name(&self, field: &str) -> String {
        match self {
            FilterOperator::Eq => field.to_string(),
            op => format!("{field}_{}", op.as_str()),
        }
    }

    /// Shape the operator's value must take.
    pub fn value_shape(&self) -> ValueShape {
        value_shape(*self)
    }

    /// Whether the operator tests for (non-)null rather than comparing values.
    pub fn is_null_check(&self) -> bool {
        matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a wire token names no operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Structural type an operator requires for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// One value of the field's kind.
    Scalar,
    /// Ordered list of values of the field's kind.
    List,
    /// Exactly two values of the field's kind.
    Pair,
    /// A boolean flag, regardless of the field's kind.
    Flag,
}

/// Value shape required by `operator`.
pub fn value_shape(operator: FilterOperator) -> ValueShape {
    match operator {
        FilterOperator::In | FilterOperator::NotIn => ValueShape::List,
        FilterOperator::Between => ValueShape::Pair,
        FilterOperator::IsNull | FilterOperator::IsNotNull => ValueShape::Flag,
        FilterOperator::Eq
        | FilterOperator::Ne
        | FilterOperator::Gt
        | FilterOperator::Gte
        | FilterOperator::Lt
        | FilterOperator::Lte
        | FilterOperator::Like
        | FilterOperator::Ilike
        | FilterOperator::StartsWith
        | FilterOperator::EndsWith
        | FilterOperator::Contains
        | FilterOperator::Regex => ValueShape::Scalar,
    }
}

/// Conventional default operators for a value kind.
pub fn default_operators(kind: &ValueKind) -> Vec<FilterOperator> {
    use FilterOperator::*;

    match kind {
        ValueKind::String => vec![
            Eq, Ne, Like, Ilike, In, NotIn, Contains, StartsWith, EndsWith,
        ],
        ValueKind::Number | ValueKind::Date => vec![Eq, Ne, Gt, Gte, Lt, Lte, In, NotIn, Between],
        ValueKind::Boolean => vec![Eq, Ne],
        ValueKind::Enum(_) => vec![Eq, Ne, In, NotIn],
        ValueKind::Array => vec![Contains, In],
    }
}

/// Whether `operator` may be configured on a field of `kind`.
pub fn is_legal(operator: FilterOperator, kind: &ValueKind) -> bool {
    use FilterOperator::*;

    if operator.is_null_check() {
        return true;
    }

    match kind {
        ValueKind::String => matches!(
            operator,
            Eq | Ne | Like | Ilike | StartsWith | EndsWith | Contains | In | NotIn | Regex
        ),
        ValueKind::Number | ValueKind::Date => {
            matches!(operator, Eq | Ne | Gt | Gte | Lt | Lte | In | NotIn | Between)
        }
        ValueKind::Boolean => matches!(operator, Eq | Ne),
        ValueKind::Enum(_) => matches!(operator, Eq | Ne | In | NotIn),
        ValueKind::Array => matches!(operator, Contains | In | NotIn),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<ValueKind> {
        vec![
            ValueKind::String,
            ValueKind::Number,
            ValueKind::Boolean,
            ValueKind::Date,
            ValueKind::Enum(vec!["a".to_string()]),
            ValueKind::Array,
        ]
    }

    #[test]
    fn defaults_are_always_legal() {
        for kind in all_kinds() {
            for op in default_operators(&kind) {
                assert!(is_legal(op, &kind), "{op} should be legal for {kind}");
            }
        }
    }

    #[test]
    fn string_defaults() {
        let ops = default_operators(&ValueKind::String);
        assert_eq!(ops.len(), 9);
        assert!(ops.contains(&FilterOperator::Ilike));
        assert!(!ops.contains(&FilterOperator::Regex));
        assert!(!ops.contains(&FilterOperator::Between));
    }

    #[test]
    fn illegal_combinations() {
        assert!(!is_legal(FilterOperator::Gt, &ValueKind::String));
        assert!(!is_legal(FilterOperator::Like, &ValueKind::Number));
        assert!(!is_legal(FilterOperator::Between, &ValueKind::Boolean));
        assert!(!is_legal(FilterOperator::Regex, &ValueKind::Date));
        assert!(is_legal(FilterOperator::IsNull, &ValueKind::Boolean));
    }

    #[test]
    fn shapes() {
        assert_eq!(value_shape(FilterOperator::Eq), ValueShape::Scalar);
        assert_eq!(value_shape(FilterOperator::Regex), ValueShape::Scalar);
        assert_eq!(value_shape(FilterOperator::NotIn), ValueShape::List);
        assert_eq!(value_shape(FilterOperator::Between), ValueShape::Pair);
        assert_eq!(value_shape(FilterOperator::IsNotNull), ValueShape::Flag);
    }

    #[test]
    fn wire_tokens_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(op.as_str().parse::<FilterOperator>().unwrap(), op);
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
        assert!("exists".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn wire_name_uses_bare_field_for_eq() {
        assert_eq!(FilterOperator::Eq.wire_name("status"), "status");
        assert_eq!(FilterOperator::Between.wire_name("price"), "price_between");
        assert_eq!(FilterOperator::NotIn.wire_name("created_at"), "created_at_notIn");
    }

    #[test]
    fn enum_kind_deserializes_with_values() {
        let kind: ValueKind = serde_json::from_str(r#"{"enum": ["draft", "live"]}"#).unwrap();
        assert_eq!(
            kind,
            ValueKind::Enum(vec!["draft".to_string(), "live".to_string()])
        );
        let kind: ValueKind = serde_json::from_str(r#""number""#).unwrap();
        assert_eq!(kind, ValueKind::Number);
    }
}
