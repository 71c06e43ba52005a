//! Sorting module: sortable fields and default ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::collect_field_names;
use crate::contract::{InputField, InputSpec, ModuleKind, QueryModule};
use crate::error::ConfigError;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("expected 'asc' or 'desc', got '{s}'")),
        }
    }
}

/// NULL ordering preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullsOrder::First => "first",
            NullsOrder::Last => "last",
        }
    }
}

impl FromStr for NullsOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(NullsOrder::First),
            "last" => Ok(NullsOrder::Last),
            _ => Err(format!("expected 'first' or 'last', got '{s}'")),
        }
    }
}

/// Sorting options as declared by a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingOptions {
    /// Field sorted on when the request names none.
    pub default_field: Option<String>,

    /// Direction used when the request names none.
    pub default_direction: SortDirection,

    /// Accept an ordered list of sort entries in `sortBy`.
    pub allow_multiple: bool,

    /// Accept `nullsHandling`.
    pub allow_nulls_handling: bool,
}

impl SortingOptions {
    /// Sort on `field` by default.
    pub fn default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn default_direction(mut self, direction: SortDirection) -> Self {
        self.default_direction = direction;
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn allow_nulls_handling(mut self) -> Self {
        self.allow_nulls_handling = true;
        self
    }
}

/// Validated sorting descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortingConfig {
    fields: Vec<String>,
    default_field: Option<String>,
    default_direction: SortDirection,
    allow_multiple: bool,
    allow_nulls_handling: bool,
}

impl SortingConfig {
    /// Sortable fields in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn default_field(&self) -> Option<&str> {
        self.default_field.as_deref()
    }

    pub fn default_direction(&self) -> SortDirection {
        self.default_direction
    }

    pub fn allow_multiple(&self) -> bool {
        self.allow_multiple
    }

    pub fn allow_nulls_handling(&self) -> bool {
        self.allow_nulls_handling
    }
}

impl QueryModule for SortingConfig {
    fn module(&self) -> ModuleKind {
        ModuleKind::Sorting
    }

    fn input_fields(&self) -> Vec<InputField> {
        let mut sort_by = InputField::new(
            "sortBy",
            ModuleKind::Sorting,
            InputSpec::SortField {
                fields: self.fields.clone(),
                multiple: self.allow_multiple,
            },
        );
        if let Some(field) = &self.default_field {
            sort_by = sort_by.with_default(json!(field));
        }

        vec![
            sort_by,
            InputField::new(
                "sortDirection",
                ModuleKind::Sorting,
                InputSpec::Choice {
                    values: vec!["asc".to_string(), "desc".to_string()],
                },
            )
            .with_default(json!(self.default_direction.as_str())),
            InputField::new(
                "nullsHandling",
                ModuleKind::Sorting,
                InputSpec::Choice {
                    values: vec!["first".to_string(), "last".to_string()],
                },
            ),
        ]
    }
}

/// Build a sorting descriptor.
///
/// `fields` must be non-empty and unique; a default field must be one of them.
pub fn build_sorting_config<I, S>(
    fields: I,
    options: SortingOptions,
) -> Result<SortingConfig, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields = collect_field_names("sorting", fields)?;
    if fields.is_empty() {
        return Err(ConfigError::EmptyFieldSet {
            module: "sorting",
            what: "sortable field",
        });
    }

    if let Some(default) = &options.default_field
        && !fields.contains(default)
    {
        return Err(ConfigError::UnknownDefaultField {
            field: default.clone(),
        });
    }

    Ok(SortingConfig {
        fields,
        default_field: options.default_field,
        default_direction: options.default_direction,
        allow_multiple: options.allow_multiple,
        allow_nulls_handling: options.allow_nulls_handling,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ascending() {
        let config = build_sorting_config(["name"], SortingOptions::default()).unwrap();
        assert_eq!(config.default_direction(), SortDirection::Asc);
        assert!(config.default_field().is_none());
        assert!(!config.allow_multiple());
    }

    #[test]
    fn rejects_empty_fields() {
        let err = build_sorting_config(Vec::<String>::new(), SortingOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFieldSet { module: "sorting", .. }));
    }

    #[test]
    fn rejects_default_outside_fields() {
        let err = build_sorting_config(
            ["name", "createdAt"],
            SortingOptions::default().default_field("updatedAt"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDefaultField {
                field: "updatedAt".to_string()
            }
        );
    }

    #[test]
    fn direction_parsing() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("down".parse::<SortDirection>().is_err());
        assert_eq!("last".parse::<NullsOrder>(), Ok(NullsOrder::Last));
    }

    #[test]
    fn sort_by_default_is_published() {
        let config = build_sorting_config(
            ["name", "createdAt"],
            SortingOptions::default().default_field("createdAt"),
        )
        .unwrap();
        let fields = config.input_fields();
        assert_eq!(fields[0].name, "sortBy");
        assert_eq!(fields[0].default, Some(json!("createdAt")));
        assert_eq!(fields[1].default, Some(json!("asc")));
    }
}
