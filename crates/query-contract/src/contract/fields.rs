//! Input field specifications.
//!
//! Every wire key a contract accepts is described by an [`InputField`]: the
//! module that owns it, the typed spec its raw value is checked against, and
//! its default. Modules publish their fields through [`QueryModule`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operator::{FilterOperator, ValueKind, ValueShape};
use crate::request::LogicalOp;

/// Module that owns a wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Pagination,
    Sorting,
    Filtering,
    Search,
    Extra,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Pagination => "pagination",
            ModuleKind::Sorting => "sorting",
            ModuleKind::Filtering => "filtering",
            ModuleKind::Search => "search",
            ModuleKind::Extra => "extra fields",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed spec a raw value is validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputSpec {
    /// Whole number within `min..=max`.
    Integer { min: i64, max: Option<i64> },
    /// Non-empty free text.
    Text,
    /// Boolean flag.
    Flag,
    /// One of a closed set of tokens.
    Choice { values: Vec<String> },
    /// Sort field name, or a list of sort entries when `multiple`.
    SortField { fields: Vec<String>, multiple: bool },
    /// Search text with length bounds in characters.
    SearchQuery { min_length: usize, max_length: usize },
    /// Subset of the allowed names.
    NameList { allowed: Vec<String> },
    /// Filter condition on `field` using `operator`.
    Filter {
        field: String,
        operator: FilterOperator,
        kind: ValueKind,
        shape: ValueShape,
    },
    /// `_and` / `_or` list of nested filter objects.
    Logical { op: LogicalOp },
    /// Endpoint-specific scalar.
    Scalar { kind: ValueKind },
}

/// One accepted wire field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputField {
    /// Wire key.
    pub name: String,

    /// Owning module.
    pub module: ModuleKind,

    /// Value spec.
    pub spec: InputSpec,

    /// Whether the key must be present.
    pub required: bool,

    /// Value used when the key is absent.
    pub default: Option<Value>,
}

impl InputField {
    /// Create an optional field with no default.
    pub fn new(name: impl Into<String>, module: ModuleKind, spec: InputSpec) -> Self {
        Self {
            name: name.into(),
            module,
            spec,
            required: false,
            default: None,
        }
    }

    /// Set the value used when the key is absent.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Human-readable owner, used in collision errors.
    pub fn owner(&self) -> String {
        match &self.spec {
            InputSpec::Filter { field, .. } => format!("filtering field '{field}'"),
            _ => self.module.to_string(),
        }
    }
}

/// A query module that contributes wire fields to a contract.
pub trait QueryModule {
    /// Owning module kind.
    fn module(&self) -> ModuleKind;

    /// Wire fields this module introduces.
    fn input_fields(&self) -> Vec<InputField>;
}
