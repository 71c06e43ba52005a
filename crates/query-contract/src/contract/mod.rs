//! Schema composer.
//!
//! [`compose`] merges config descriptors and extra fields into one immutable
//! [`QueryContract`]. Every wire key has exactly one owner; a key introduced
//! twice is a [`ConfigError::FieldCollision`], never a silent overwrite.

mod fields;
mod meta;
mod options;

pub use fields::{InputField, InputSpec, ModuleKind, QueryModule};
pub use meta::{ListResponse, MetaField, MetaSchema, MetaValueKind, ResponseMeta};
pub use options::{BetweenFormat, ContractOptions, UnknownFieldPolicy};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    FilteringConfig, PaginationConfig, SearchConfig, SortingConfig, is_valid_field_name,
};
use crate::error::ConfigError;
use crate::operator::ValueKind;
use crate::value::{Scalar, coerce_scalar};

/// Endpoint-specific parameter outside the four standard modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraField {
    pub name: String,
    pub kind: ValueKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default: Option<Value>,
}

impl ExtraField {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Typed default, if one is declared.
    pub(crate) fn typed_default(&self) -> Result<Option<Scalar>, ConfigError> {
        self.default
            .as_ref()
            .map(|raw| {
                coerce_scalar(&self.kind, raw).map_err(|detail| ConfigError::InvalidDefault {
                    field: self.name.clone(),
                    detail,
                })
            })
            .transpose()
    }
}

impl QueryModule for ExtraField {
    fn module(&self) -> ModuleKind {
        ModuleKind::Extra
    }

    fn input_fields(&self) -> Vec<InputField> {
        let mut field = InputField::new(
            self.name.clone(),
            ModuleKind::Extra,
            InputSpec::Scalar {
                kind: self.kind.clone(),
            },
        );
        if self.required {
            field = field.required();
        }
        if let Some(default) = &self.default {
            field = field.with_default(default.clone());
        }
        vec![field]
    }
}

/// Descriptors to merge into one contract. Absent modules contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct ContractModules {
    pub pagination: Option<PaginationConfig>,
    pub sorting: Option<SortingConfig>,
    pub filtering: Option<FilteringConfig>,
    pub search: Option<SearchConfig>,
    pub extra_fields: Vec<ExtraField>,
    pub options: ContractOptions,
}

/// Composed, immutable query contract for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryContract {
    pagination: Option<PaginationConfig>,
    sorting: Option<SortingConfig>,
    filtering: Option<FilteringConfig>,
    search: Option<SearchConfig>,
    extra_fields: Vec<ExtraField>,
    #[serde(skip)]
    extra_defaults: BTreeMap<String, Scalar>,
    options: ContractOptions,
    inputs: BTreeMap<String, InputField>,
    meta: MetaSchema,
}

impl QueryContract {
    pub fn pagination(&self) -> Option<&PaginationConfig> {
        self.pagination.as_ref()
    }

    pub fn sorting(&self) -> Option<&SortingConfig> {
        self.sorting.as_ref()
    }

    pub fn filtering(&self) -> Option<&FilteringConfig> {
        self.filtering.as_ref()
    }

    pub fn search(&self) -> Option<&SearchConfig> {
        self.search.as_ref()
    }

    pub fn extra_fields(&self) -> &[ExtraField] {
        &self.extra_fields
    }

    pub(crate) fn extra_default(&self, name: &str) -> Option<&Scalar> {
        self.extra_defaults.get(name)
    }

    pub fn options(&self) -> &ContractOptions {
        &self.options
    }

    /// Every accepted wire field, ordered by wire name.
    pub fn input_fields(&self) -> impl Iterator<Item = &InputField> + '_ {
        self.inputs.values()
    }

    /// Spec for one wire key.
    pub fn input_field(&self, name: &str) -> Option<&InputField> {
        self.inputs.get(name)
    }

    /// Module owning a wire key.
    pub fn owner_of(&self, name: &str) -> Option<ModuleKind> {
        self.inputs.get(name).map(|f| f.module)
    }

    /// Response metadata shape.
    pub fn meta_schema(&self) -> &MetaSchema {
        &self.meta
    }
}

/// Claim every wire field of `module`, rejecting names already owned.
fn claim(
    inputs: &mut BTreeMap<String, InputField>,
    module: &dyn QueryModule,
) -> Result<(), ConfigError> {
    for field in module.input_fields() {
        if let Some(existing) = inputs.get(&field.name) {
            return Err(ConfigError::FieldCollision {
                name: field.name.clone(),
                first: existing.owner(),
                second: field.owner(),
            });
        }
        inputs.insert(field.name.clone(), field);
    }
    Ok(())
}

/// Compose descriptors into a contract.
pub fn compose(modules: ContractModules) -> Result<QueryContract, ConfigError> {
    let ContractModules {
        pagination,
        sorting,
        filtering,
        search,
        extra_fields,
        options,
    } = modules;

    let mut inputs = BTreeMap::new();
    if let Some(pagination) = &pagination {
        claim(&mut inputs, pagination)?;
    }
    if let Some(sorting) = &sorting {
        claim(&mut inputs, sorting)?;
    }
    if let Some(filtering) = &filtering {
        claim(&mut inputs, filtering)?;
    }
    if let Some(search) = &search {
        claim(&mut inputs, search)?;
    }

    let mut extra_defaults = BTreeMap::new();
    for extra in &extra_fields {
        if !is_valid_field_name(&extra.name) {
            return Err(ConfigError::InvalidFieldName {
                module: "extra",
                field: extra.name.clone(),
            });
        }
        claim(&mut inputs, extra)?;
        if let Some(default) = extra.typed_default()? {
            extra_defaults.insert(extra.name.clone(), default);
        }
    }

    let meta = MetaSchema::build(pagination.as_ref(), sorting.is_some(), filtering.is_some());

    tracing::debug!(
        input_fields = inputs.len(),
        meta_fields = meta.len(),
        "composed query contract"
    );

    Ok(QueryContract {
        pagination,
        sorting,
        filtering,
        search,
        extra_fields,
        extra_defaults,
        options,
        inputs,
        meta,
    })
}
