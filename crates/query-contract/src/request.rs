//! Validated query request types.
//!
//! A [`QueryRequest`] holds only what the client supplied or what a contract
//! defaulted. It keeps no reference to the contract that produced it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{NullsOrder, SearchMode, SortDirection};
use crate::operator::FilterOperator;
use crate::value::Scalar;

/// Position within a result set. At most one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PagePosition {
    /// Number of items to skip.
    Offset(u64),
    /// 1-indexed page number.
    Page(u32),
    /// Opaque continuation token.
    Cursor(String),
}

/// Pagination part of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,

    #[serde(flatten)]
    pub position: Option<PagePosition>,
}

/// One sort entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullsOrder>,
}

/// Typed filter condition, one variant per operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum FilterCondition {
    Eq(Scalar),
    Ne(Scalar),
    Gt(Scalar),
    Gte(Scalar),
    Lt(Scalar),
    Lte(Scalar),
    Like(String),
    Ilike(String),
    StartsWith(String),
    EndsWith(String),
    Contains(Scalar),
    In(Vec<Scalar>),
    NotIn(Vec<Scalar>),
    Between(Scalar, Scalar),
    IsNull(bool),
    IsNotNull(bool),
    /// Pattern already checked to compile.
    Regex(String),
}

impl FilterCondition {
    pub fn operator(&self) -> FilterOperator {
        match self {
            FilterCondition::Eq(_) => FilterOperator::Eq,
            FilterCondition::Ne(_) => FilterOperator::Ne,
            FilterCondition::Gt(_) => FilterOperator::Gt,
            FilterCondition::Gte(_) => FilterOperator::Gte,
            FilterCondition::Lt(_) => FilterOperator::Lt,
            FilterCondition::Lte(_) => FilterOperator::Lte,
            FilterCondition::Like(_) => FilterOperator::Like,
            FilterCondition::Ilike(_) => FilterOperator::Ilike,
            FilterCondition::StartsWith(_) => FilterOperator::StartsWith,
            FilterCondition::EndsWith(_) => FilterOperator::EndsWith,
            FilterCondition::Contains(_) => FilterOperator::Contains,
            FilterCondition::In(_) => FilterOperator::In,
            FilterCondition::NotIn(_) => FilterOperator::NotIn,
            FilterCondition::Between(..) => FilterOperator::Between,
            FilterCondition::IsNull(_) => FilterOperator::IsNull,
            FilterCondition::IsNotNull(_) => FilterOperator::IsNotNull,
            FilterCondition::Regex(_) => FilterOperator::Regex,
        }
    }
}

/// A condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub field: String,

    #[serde(flatten)]
    pub condition: FilterCondition,
}

impl FilterEntry {
    pub fn new(field: impl Into<String>, condition: FilterCondition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }

    pub fn operator(&self) -> FilterOperator {
        self.condition.operator()
    }
}

/// Logical combinator for nested filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Wire key that introduces a group (`_and` / `_or`).
    pub fn wire_name(&self) -> &'static str {
        match self {
            LogicalOp::And => "_and",
            LogicalOp::Or => "_or",
        }
    }

    pub fn from_wire(key: &str) -> Option<Self> {
        match key {
            "_and" => Some(LogicalOp::And),
            "_or" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("and"),
            LogicalOp::Or => f.write_str("or"),
        }
    }
}

/// Group of nested filter nodes joined by one logical operator.
///
/// Each element of `nodes` is one nested filter object from the wire; its own
/// conditions are implicitly AND-ed, so it is kept as an `and` group when it
/// holds more than one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub logical: LogicalOp,
    pub filters: Vec<FilterNode>,
}

/// A filter tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Condition(FilterEntry),
    Group(FilterGroup),
}

impl FilterNode {
    /// Number of leaf conditions under this node.
    pub fn condition_count(&self) -> usize {
        match self {
            FilterNode::Condition(_) => 1,
            FilterNode::Group(group) => group.filters.iter().map(FilterNode::condition_count).sum(),
        }
    }
}

impl From<FilterEntry> for FilterNode {
    fn from(entry: FilterEntry) -> Self {
        FilterNode::Condition(entry)
    }
}

/// Search part of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Trimmed search text.
    pub query: String,

    /// Fields to search; the configured searchable fields when not narrowed.
    pub fields: Vec<String>,

    pub mode: SearchMode,
    pub case_sensitive: bool,
    pub use_regex: bool,
}

/// A validated list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(flatten)]
    pub pagination: Option<PageRequest>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchRequest>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Scalar>,
}

impl QueryRequest {
    pub fn limit(&self) -> Option<u32> {
        self.pagination.as_ref().map(|p| p.limit)
    }

    pub fn position(&self) -> Option<&PagePosition> {
        self.pagination.as_ref().and_then(|p| p.position.as_ref())
    }

    pub fn offset(&self) -> Option<u64> {
        match self.position() {
            Some(PagePosition::Offset(offset)) => Some(*offset),
            _ => None,
        }
    }

    pub fn page(&self) -> Option<u32> {
        match self.position() {
            Some(PagePosition::Page(page)) => Some(*page),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        match self.position() {
            Some(PagePosition::Cursor(cursor)) => Some(cursor),
            _ => None,
        }
    }

    /// Primary sort field.
    pub fn sort_by(&self) -> Option<&str> {
        self.sort.first().map(|s| s.field.as_str())
    }

    /// Primary sort direction.
    pub fn sort_direction(&self) -> Option<SortDirection> {
        self.sort.first().map(|s| s.direction)
    }

    /// Number of leaf filter conditions, including nested ones.
    pub fn filter_count(&self) -> usize {
        self.filters.iter().map(FilterNode::condition_count).sum()
    }

    /// Top-level conditions on `field`.
    pub fn filters_on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterEntry> + 'a {
        self.filters.iter().filter_map(move |node| match node {
            FilterNode::Condition(entry) if entry.field == field => Some(entry),
            _ => None,
        })
    }

    pub fn extra(&self, name: &str) -> Option<&Scalar> {
        self.extra.get(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_entry_serializes_operator_and_value() {
        let entry = FilterEntry::new(
            "price",
            FilterCondition::Between(Scalar::Integer(10), Scalar::Integer(50)),
        );
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"field": "price", "operator": "between", "value": [10, 50]})
        );
        assert_eq!(entry.operator(), FilterOperator::Between);
    }

    #[test]
    fn request_flattens_pagination() {
        let request = QueryRequest {
            pagination: Some(PageRequest {
                limit: 10,
                position: Some(PagePosition::Offset(0)),
            }),
            sort: vec![SortSpec {
                field: "createdAt".to_string(),
                direction: SortDirection::Asc,
                nulls: None,
            }],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"limit": 10, "offset": 0, "sort": [{"field": "createdAt", "direction": "asc"}]})
        );
        assert_eq!(request.offset(), Some(0));
        assert_eq!(request.page(), None);
        assert_eq!(request.sort_by(), Some("createdAt"));
    }

    #[test]
    fn filter_count_includes_nested() {
        let request = QueryRequest {
            filters: vec![
                FilterEntry::new("age", FilterCondition::Gt(Scalar::Integer(18))).into(),
                FilterNode::Group(FilterGroup {
                    logical: LogicalOp::Or,
                    filters: vec![
                        FilterEntry::new("status", FilterCondition::Eq("a".into())).into(),
                        FilterEntry::new("status", FilterCondition::Eq("b".into())).into(),
                    ],
                }),
            ],
            ..Default::default()
        };
        assert_eq!(request.filter_count(), 3);
        assert_eq!(request.filters_on("age").count(), 1);
    }

    #[test]
    fn logical_wire_names() {
        assert_eq!(LogicalOp::from_wire("_or"), Some(LogicalOp::Or));
        assert_eq!(LogicalOp::And.wire_name(), "_and");
        assert_eq!(LogicalOp::from_wire("or"), None);
    }
}
