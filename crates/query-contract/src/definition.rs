//! Declarative contract definitions.
//!
//! A service may declare its list endpoints in JSON or TOML instead of code:
//!
//! ```toml
//! [pagination]
//! default_limit = 20
//! modes = ["offset", "cursor"]
//!
//! [sorting]
//! fields = ["name", "createdAt"]
//! default_field = "createdAt"
//!
//! [filtering.fields.age]
//! kind = "number"
//! operators = ["gt", "lt"]
//! ```
//!
//! Definitions are built through the same config builders as code, so every
//! declaration rule applies unchanged.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::config::{FieldOptions, FilteringOptions, PaginationOptions, SearchOptions, SortingOptions};
use crate::contract::{ContractOptions, ExtraField, QueryContract};
use crate::error::ConfigError;

/// Sortable fields and sorting options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortingDefinition {
    pub fields: Vec<String>,

    #[serde(flatten)]
    pub options: SortingOptions,
}

/// Filterable fields keyed by name, and filtering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteringDefinition {
    pub fields: BTreeMap<String, FieldOptions>,

    #[serde(flatten)]
    pub options: FilteringOptions,
}

/// Searchable fields and search options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDefinition {
    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(flatten)]
    pub options: SearchOptions,
}

/// A contract declared as data. Absent sections disable their module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    #[serde(default)]
    pub pagination: Option<PaginationOptions>,

    #[serde(default)]
    pub sorting: Option<SortingDefinition>,

    #[serde(default)]
    pub filtering: Option<FilteringDefinition>,

    #[serde(default)]
    pub search: Option<SearchDefinition>,

    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,

    #[serde(default)]
    pub options: ContractOptions,
}

impl ContractDefinition {
    /// Parse a definition from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse contract definition JSON")
    }

    /// Parse a definition from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse contract definition TOML")
    }

    /// Read a definition file; the format follows the extension (`.json` or `.toml`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read contract definition: {}", path.display()))?;

        let definition = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => anyhow::bail!(
                "unsupported contract definition format: {} (expected .json or .toml)",
                path.display()
            ),
        };
        definition.with_context(|| format!("in {}", path.display()))
    }

    /// Build the contract, applying every declaration rule.
    pub fn build(&self) -> Result<QueryContract, ConfigError> {
        let mut builder = QueryBuilder::new().options(self.options.clone());

        if let Some(pagination) = &self.pagination {
            builder = builder.paginate(pagination.clone());
        }
        if let Some(sorting) = &self.sorting {
            builder = builder.sort(sorting.fields.iter().cloned(), sorting.options.clone());
        }
        if let Some(filtering) = &self.filtering {
            builder = builder.filter_options(filtering.options.clone());
            for (name, field) in &filtering.fields {
                builder = builder.filter(name.clone(), field.clone());
            }
        }
        if let Some(search) = &self.search {
            builder = builder.search(search.fields.iter().cloned(), search.options.clone());
        }
        for extra in &self.extra_fields {
            builder = builder.extra(extra.clone());
        }

        builder.build()
    }
}

/// Load and build a contract from a definition file.
pub fn load_contract(path: &Path) -> Result<QueryContract> {
    let definition = ContractDefinition::load(path)?;
    definition
        .build()
        .with_context(|| format!("invalid contract definition: {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{PaginationMode, SortDirection};
    use crate::operator::{FilterOperator, ValueKind};

    const TOML: &str = r#"
[pagination]
default_limit = 20
max_limit = 50
modes = ["offset", "cursor"]

[sorting]
fields = ["name", "createdAt"]
default_field = "createdAt"
default_direction = "desc"

[filtering.fields.age]
kind = "number"
operators = ["gt", "lt"]

[filtering.fields.status]
kind = { enum = ["draft", "live"] }

[options]
unknown_fields = "ignore"
"#;

    #[test]
    fn toml_definition() {
        let definition = ContractDefinition::from_toml_str(TOML).unwrap();
        let pagination = definition.pagination.as_ref().unwrap();
        assert_eq!(pagination.default_limit, 20);
        assert_eq!(pagination.min_limit, 1);
        assert_eq!(
            pagination.modes,
            vec![PaginationMode::Offset, PaginationMode::Cursor]
        );

        let sorting = definition.sorting.as_ref().unwrap();
        assert_eq!(sorting.options.default_direction, SortDirection::Desc);

        let filtering = definition.filtering.as_ref().unwrap();
        assert!(filtering.options.allow_logical_operators);
        assert_eq!(
            filtering.fields["age"].operators,
            Some(vec![FilterOperator::Gt, FilterOperator::Lt])
        );
        assert_eq!(
            filtering.fields["status"].kind,
            ValueKind::Enum(vec!["draft".to_string(), "live".to_string()])
        );

        let contract = definition.build().unwrap();
        assert!(contract.input_field("age_gt").is_some());
        assert!(contract.input_field("cursor").is_some());
        assert!(contract.search().is_none());
    }

    #[test]
    fn json_definition() {
        let definition = ContractDefinition::from_json_str(
            r#"{
                "search": {"fields": ["name"], "allow_field_selection": true, "min_query_length": 3},
                "extra_fields": [{"name": "tenant", "kind": "string", "required": true}]
            }"#,
        )
        .unwrap();
        let contract = definition.build().unwrap();
        let search = contract.search().unwrap();
        assert_eq!(search.min_query_length(), 3);
        assert_eq!(search.max_query_length(), 200);
        assert!(contract.input_field("tenant").unwrap().required);
    }

    #[test]
    fn build_applies_declaration_rules() {
        let definition = ContractDefinition::from_json_str(
            r#"{"sorting": {"fields": ["name"], "default_field": "missing"}}"#,
        )
        .unwrap();
        assert!(matches!(
            definition.build(),
            Err(ConfigError::UnknownDefaultField { .. })
        ));
    }

    #[test]
    fn malformed_text_has_context() {
        let err = ContractDefinition::from_json_str("{not json").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse contract definition JSON"));
    }
}
