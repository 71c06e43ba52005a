//! Filtering module: filterable fields, their operators, and value shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::is_valid_field_name;
use crate::contract::{InputField, InputSpec, ModuleKind, QueryModule};
use crate::error::ConfigError;
use crate::operator::{FilterOperator, ValueKind, ValueShape, default_operators, is_legal};
use crate::request::LogicalOp;

/// Declaration of one filterable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Kind of value the field holds.
    pub kind: ValueKind,

    /// Explicit operator set; `None` uses the kind's defaults.
    #[serde(default)]
    pub operators: Option<Vec<FilterOperator>>,

    /// Whether the field may be NULL (enables `isNull`/`isNotNull`).
    #[serde(default)]
    pub nullable: bool,
}

impl FieldOptions {
    /// Field of `kind` with default operators.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            operators: None,
            nullable: false,
        }
    }

    /// Restrict the field to an explicit operator set.
    pub fn operators(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.operators = Some(operators.into_iter().collect());
        self
    }

    /// Mark the field nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Filtering options shared by all fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilteringOptions {
    /// Accept `_and` / `_or` groups of nested filter objects (default: true).
    pub allow_logical_operators: bool,
}

impl Default for FilteringOptions {
    fn default() -> Self {
        Self {
            allow_logical_operators: true,
        }
    }
}

/// Validated filter declaration for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFilterConfig {
    name: String,
    kind: ValueKind,
    operators: Vec<FilterOperator>,
    nullable: bool,
    shapes: BTreeMap<FilterOperator, ValueShape>,
}

impl FieldFilterConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Configured operators in declaration order.
    pub fn operators(&self) -> &[FilterOperator] {
        &self.operators
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.shapes.contains_key(&operator)
    }

    /// Value shape for a configured operator.
    pub fn shape(&self, operator: FilterOperator) -> Option<ValueShape> {
        self.shapes.get(&operator).copied()
    }
}

/// Validated filtering descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteringConfig {
    fields: Vec<FieldFilterConfig>,
    allow_logical_operators: bool,
}

impl FilteringConfig {
    /// Filterable fields in declaration order.
    pub fn fields(&self) -> &[FieldFilterConfig] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldFilterConfig> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn allow_logical_operators(&self) -> bool {
        self.allow_logical_operators
    }
}

impl QueryModule for FilteringConfig {
    fn module(&self) -> ModuleKind {
        ModuleKind::Filtering
    }

    fn input_fields(&self) -> Vec<InputField> {
        let mut inputs = Vec::new();
        for field in &self.fields {
            // Bare name is claimed even without `eq`.
            inputs.push(InputField::new(
                field.name.clone(),
                ModuleKind::Filtering,
                InputSpec::Filter {
                    field: field.name.clone(),
                    operator: FilterOperator::Eq,
                    kind: field.kind.clone(),
                    shape: ValueShape::Scalar,
                },
            ));
            for op in field.operators.iter().filter(|op| **op != FilterOperator::Eq) {
                inputs.push(InputField::new(
                    op.wire_name(&field.name),
                    ModuleKind::Filtering,
                    InputSpec::Filter {
                        field: field.name.clone(),
                        operator: *op,
                        kind: field.kind.clone(),
                        shape: op.value_shape(),
                    },
                ));
            }
            // `<field>_exists` aliases `isNotNull`.
            if field.supports(FilterOperator::IsNotNull) {
                inputs.push(InputField::new(
                    format!("{}_exists", field.name),
                    ModuleKind::Filtering,
                    InputSpec::Filter {
                        field: field.name.clone(),
                        operator: FilterOperator::IsNotNull,
                        kind: field.kind.clone(),
                        shape: ValueShape::Flag,
                    },
                ));
            }
        }

        if self.allow_logical_operators {
            for op in [LogicalOp::And, LogicalOp::Or] {
                inputs.push(InputField::new(
                    op.wire_name(),
                    ModuleKind::Filtering,
                    InputSpec::Logical { op },
                ));
            }
        }
        inputs
    }
}

/// Resolve and validate one field declaration.
fn build_field(name: String, options: FieldOptions) -> Result<FieldFilterConfig, ConfigError> {
    if !is_valid_field_name(&name) {
        return Err(ConfigError::InvalidFieldName {
            module: "filtering",
            field: name,
        });
    }
    if LogicalOp::from_wire(&name).is_some() {
        return Err(ConfigError::ReservedFieldName { field: name });
    }
    if let ValueKind::Enum(values) = &options.kind
        && values.is_empty()
    {
        return Err(ConfigError::EmptyEnum { field: name });
    }

    let requested = match options.operators {
        Some(ops) => ops,
        None => {
            let mut ops = default_operators(&options.kind);
            if options.nullable {
                ops.extend([FilterOperator::IsNull, FilterOperator::IsNotNull]);
            }
            ops
        }
    };

    let mut operators = Vec::with_capacity(requested.len());
    for op in requested {
        if operators.contains(&op) {
            continue;
        }
        if !is_legal(op, &options.kind) {
            return Err(ConfigError::IllegalOperator {
                field: name,
                operator: op,
                kind: options.kind,
            });
        }
        if op.is_null_check() && !options.nullable {
            return Err(ConfigError::NullOperatorOnNonNullable {
                field: name,
                operator: op,
            });
        }
        operators.push(op);
    }

    if operators.is_empty() {
        return Err(ConfigError::EmptyOperatorSet { field: name });
    }

    let shapes = operators.iter().map(|op| (*op, op.value_shape())).collect();

    Ok(FieldFilterConfig {
        name,
        kind: options.kind,
        operators,
        nullable: options.nullable,
        shapes,
    })
}

/// Build a filtering descriptor from `(field name, options)` pairs.
pub fn build_filtering_config<I, S>(
    fields: I,
    options: FilteringOptions,
) -> Result<FilteringConfig, ConfigError>
where
    I: IntoIterator<Item = (S, FieldOptions)>,
    S: Into<String>,
{
    let mut built: Vec<FieldFilterConfig> = Vec::new();
    for (name, field_options) in fields {
        let field = build_field(name.into(), field_options)?;
        if built.iter().any(|f| f.name == field.name) {
            return Err(ConfigError::DuplicateField {
                module: "filtering",
                field: field.name,
            });
        }
        built.push(field);
    }

    if built.is_empty() {
        return Err(ConfigError::EmptyFieldSet {
            module: "filtering",
            what: "filterable field",
        });
    }

    Ok(FilteringConfig {
        fields: built,
        allow_logical_operators: options.allow_logical_operators,
    })
}
