//! Filter key resolution and value typing.
//!
//! Wire keys are `<field>` (eq) or `<field>_<op>`. Field names may contain
//! underscores, so suffixes are tried from the right and the longest
//! configured field prefix wins.

use std::collections::BTreeSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::{FieldFilterConfig, FilteringConfig};
use crate::contract::{BetweenFormat, ContractOptions, ModuleKind, QueryContract};
use crate::error::FieldError;
use crate::operator::{FilterOperator, ValueKind};
use crate::request::{FilterCondition, FilterEntry, FilterGroup, FilterNode, LogicalOp};
use crate::value::{Scalar, as_list, coerce_bool, coerce_scalar, coerce_text, describe, parse_embedded};

/// Alias suffix for `isNotNull`.
const EXISTS_SUFFIX: &str = "exists";

/// What a wire key means to the filtering module.
#[derive(Debug, PartialEq)]
pub(crate) enum FilterKey<'a> {
    Condition {
        field: &'a FieldFilterConfig,
        operator: FilterOperator,
    },
    Logical(LogicalOp),
    LogicalDisabled(LogicalOp),
    UnknownOperator {
        field: &'a FieldFilterConfig,
        token: &'a str,
    },
    NotFilter,
}

/// Resolve a wire key against the configured fields.
pub(crate) fn resolve_key<'a>(config: &'a FilteringConfig, key: &'a str) -> FilterKey<'a> {
    if let Some(op) = LogicalOp::from_wire(key) {
        return if config.allow_logical_operators() {
            FilterKey::Logical(op)
        } else {
            FilterKey::LogicalDisabled(op)
        };
    }

    if let Some(field) = config.field(key) {
        return if field.supports(FilterOperator::Eq) {
            FilterKey::Condition {
                field,
                operator: FilterOperator::Eq,
            }
        } else {
            FilterKey::UnknownOperator { field, token: "eq" }
        };
    }

    for (idx, _) in key.rmatch_indices('_') {
        let Some(field) = config.field(&key[..idx]) else {
            continue;
        };
        let token = &key[idx + 1..];
        let operator = if token == EXISTS_SUFFIX {
            Some(FilterOperator::IsNotNull)
        } else {
            token.parse::<FilterOperator>().ok()
        };
        return match operator {
            Some(operator) if operator != FilterOperator::Eq && field.supports(operator) => {
                FilterKey::Condition { field, operator }
            }
            _ => FilterKey::UnknownOperator { field, token },
        };
    }

    FilterKey::NotFilter
}

/// Filter validation state for one request.
struct FilterValidator<'a> {
    config: &'a FilteringConfig,
    options: &'a ContractOptions,
    errors: &'a mut Vec<FieldError>,
}

impl FilterValidator<'_> {
    fn scalar(&mut self, key: &str, kind: &ValueKind, value: &Value) -> Option<Scalar> {
        match coerce_scalar(kind, value) {
            Ok(scalar) => Some(scalar),
            Err(message) => {
                self.errors.push(FieldError::type_mismatch(key, message));
                None
            }
        }
    }

    fn text(&mut self, key: &str, value: &Value) -> Option<String> {
        match coerce_text(value) {
            Ok(text) => Some(text),
            Err(message) => {
                self.errors.push(FieldError::type_mismatch(key, message));
                None
            }
        }
    }

    fn list(&mut self, key: &str, kind: &ValueKind, value: &Value) -> Option<Vec<Scalar>> {
        let items = match as_list(value) {
            Ok(items) => items,
            Err(message) => {
                self.errors.push(FieldError::type_mismatch(key, message));
                return None;
            }
        };
        let mut scalars = Vec::with_capacity(items.len());
        let mut failed = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match coerce_scalar(kind, item) {
                Ok(scalar) => scalars.push(scalar),
                Err(message) => failed.push(format!("item {i}: {message}")),
            }
        }
        if !failed.is_empty() {
            self.errors
                .push(FieldError::type_mismatch(key, failed.join("; ")));
            return None;
        }
        Some(scalars)
    }

    fn pair(&mut self, key: &str, kind: &ValueKind, value: &Value) -> Option<(Scalar, Scalar)> {
        let parsed = parse_embedded(value);
        let items = match parsed.as_ref() {
            Value::Array(items) => items.clone(),
            Value::Object(object) => {
                if self.options.between_format == BetweenFormat::Tuple {
                    self.errors.push(FieldError::type_mismatch(
                        key,
                        "expected a [from, to] pair; {from, to} objects are not accepted",
                    ));
                    return None;
                }
                let (Some(from), Some(to), 2) = (object.get("from"), object.get("to"), object.len())
                else {
                    self.errors.push(FieldError::type_mismatch(
                        key,
                        "expected an object with exactly 'from' and 'to'",
                    ));
                    return None;
                };
                tracing::warn!(
                    field = %key,
                    "deprecated {{from, to}} between value; send [from, to] instead"
                );
                vec![from.clone(), to.clone()]
            }
            Value::String(_) => match as_list(value) {
                Ok(items) => items,
                Err(message) => {
                    self.errors.push(FieldError::type_mismatch(key, message));
                    return None;
                }
            },
            other => {
                self.errors.push(FieldError::type_mismatch(
                    key,
                    format!("expected a [from, to] pair, got {}", describe(other)),
                ));
                return None;
            }
        };

        let [from, to] = items.as_slice() else {
            self.errors.push(FieldError::type_mismatch(
                key,
                format!("expected exactly 2 values, got {}", items.len()),
            ));
            return None;
        };
        let from = self.scalar(key, kind, from);
        let to = self.scalar(key, kind, to);
        Some((from?, to?))
    }

    fn flag(&mut self, key: &str, value: &Value) -> Option<bool> {
        match coerce_bool(value) {
            Ok(flag) => Some(flag),
            Err(message) => {
                self.errors.push(FieldError::type_mismatch(key, message));
                None
            }
        }
    }

    /// Type one condition's value by its operator's shape and the field's kind.
    fn condition(
        &mut self,
        key: &str,
        field: &FieldFilterConfig,
        operator: FilterOperator,
        value: &Value,
    ) -> Option<FilterEntry> {
        use FilterOperator as Op;

        let kind = field.kind();
        if value.is_null() && field.nullable() && matches!(operator, Op::Eq | Op::Ne) {
            let condition = if operator == Op::Eq {
                FilterCondition::Eq(Scalar::Null)
            } else {
                FilterCondition::Ne(Scalar::Null)
            };
            return Some(FilterEntry::new(field.name(), condition));
        }

        let condition = match operator {
            Op::Eq => FilterCondition::Eq(self.scalar(key, kind, value)?),
            Op::Ne => FilterCondition::Ne(self.scalar(key, kind, value)?),
            Op::Gt => FilterCondition::Gt(self.scalar(key, kind, value)?),
            Op::Gte => FilterCondition::Gte(self.scalar(key, kind, value)?),
            Op::Lt => FilterCondition::Lt(self.scalar(key, kind, value)?),
            Op::Lte => FilterCondition::Lte(self.scalar(key, kind, value)?),
            Op::Contains => FilterCondition::Contains(self.scalar(key, kind, value)?),
            Op::Like => FilterCondition::Like(self.text(key, value)?),
            Op::Ilike => FilterCondition::Ilike(self.text(key, value)?),
            Op::StartsWith => FilterCondition::StartsWith(self.text(key, value)?),
            Op::EndsWith => FilterCondition::EndsWith(self.text(key, value)?),
            Op::Regex => {
                let pattern = self.text(key, value)?;
                if let Err(e) = Regex::new(&pattern) {
                    self.errors.push(FieldError::type_mismatch(
                        key,
                        format!("invalid regular expression: {e}"),
                    ));
                    return None;
                }
                FilterCondition::Regex(pattern)
            }
            Op::In => FilterCondition::In(self.list(key, kind, value)?),
            Op::NotIn => FilterCondition::NotIn(self.list(key, kind, value)?),
            Op::Between => {
                let (from, to) = self.pair(key, kind, value)?;
                FilterCondition::Between(from, to)
            }
            Op::IsNull => FilterCondition::IsNull(self.flag(key, value)?),
            Op::IsNotNull => FilterCondition::IsNotNull(self.flag(key, value)?),
        };
        Some(FilterEntry::new(field.name(), condition))
    }

    /// `_and` / `_or`: a non-empty list of non-empty filter objects.
    fn group(&mut self, key: &str, op: LogicalOp, value: &Value, depth: usize) -> Option<FilterNode> {
        if depth > self.options.max_filter_depth {
            self.errors.push(FieldError::out_of_range(
                key,
                format!(
                    "filter groups may be nested at most {} levels deep",
                    self.options.max_filter_depth
                ),
            ));
            return None;
        }

        let parsed = parse_embedded(value);
        let items = match parsed.as_ref() {
            Value::Array(items) if !items.is_empty() => items,
            other => {
                self.errors.push(FieldError::type_mismatch(
                    key,
                    format!("expected a non-empty list of filter objects, got {}", describe(other)),
                ));
                return None;
            }
        };

        let before = self.errors.len();
        let mut filters = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = format!("{key}[{i}]");
            let Value::Object(object) = item else {
                self.errors.push(FieldError::type_mismatch(
                    path,
                    format!("expected a filter object, got {}", describe(item)),
                ));
                continue;
            };
            if object.is_empty() {
                self.errors
                    .push(FieldError::type_mismatch(path, "filter object is empty"));
                continue;
            }
            let mut nodes = self.object(Some(&path), object, depth);
            if nodes.len() == 1 {
                filters.extend(nodes.pop());
            } else {
                filters.push(FilterNode::Group(FilterGroup {
                    logical: LogicalOp::And,
                    filters: nodes,
                }));
            }
        }

        if self.errors.len() > before {
            return None;
        }
        Some(FilterNode::Group(FilterGroup {
            logical: op,
            filters,
        }))
    }

    /// Validate every key of a nested filter object.
    fn object(&mut self, prefix: Option<&str>, object: &Map<String, Value>, depth: usize) -> Vec<FilterNode> {
        let mut nodes = Vec::new();
        for (key, value) in object {
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };
            match self.key(&path, key, value, depth) {
                Ok(node) => nodes.extend(node),
                Err(()) => self.errors.push(FieldError::unknown_field(
                    path,
                    "not a filterable field",
                )),
            }
        }
        nodes
    }

    /// Validate one wire key. `Err` when the key is not a filter key at all.
    fn key(&mut self, path: &str, key: &str, value: &Value, depth: usize) -> Result<Option<FilterNode>, ()> {
        let config = self.config;
        match resolve_key(config, key) {
            FilterKey::Condition { field, operator } => {
                Ok(self.condition(path, field, operator, value).map(FilterNode::from))
            }
            FilterKey::Logical(op) => Ok(self.group(path, op, value, depth + 1)),
            FilterKey::LogicalDisabled(_) => {
                self.errors.push(FieldError::unknown_field(
                    path,
                    "logical filter groups are not enabled",
                ));
                Ok(None)
            }
            FilterKey::UnknownOperator { field, token } => {
                let configured: Vec<&str> = field.operators().iter().map(|op| op.as_str()).collect();
                self.errors.push(FieldError::unknown_operator(
                    path,
                    format!(
                        "operator '{token}' is not available on '{}'; available: {}",
                        field.name(),
                        configured.join(", ")
                    ),
                ));
                Ok(None)
            }
            FilterKey::NotFilter => Err(()),
        }
    }
}

/// Validate every top-level filter key of `raw`.
///
/// Keys owned by other modules are skipped. Returns the filter nodes and the
/// set of keys this module handled, including rejected ones.
pub(super) fn validate_filtering<'r>(
    contract: &QueryContract,
    config: &FilteringConfig,
    raw: &'r Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> (Vec<FilterNode>, BTreeSet<&'r str>) {
    let mut validator = FilterValidator {
        config,
        options: contract.options(),
        errors,
    };

    let mut nodes = Vec::new();
    let mut handled = BTreeSet::new();
    let before = validator.errors.len();
    for (key, value) in raw {
        match contract.owner_of(key) {
            None | Some(ModuleKind::Filtering) => {}
            Some(_) => continue,
        }
        if let Ok(node) = validator.key(key, key, value, 0) {
            handled.insert(key.as_str());
            nodes.extend(node);
        }
    }

    if validator.errors.len() > before {
        nodes.clear();
    }
    (nodes, handled)
}
