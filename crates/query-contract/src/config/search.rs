//! Search module: free-text query constraints.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::collect_field_names;
use crate::contract::{InputField, InputSpec, ModuleKind, QueryModule};
use crate::error::ConfigError;

/// How the search text is matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Exact,
}

impl SearchMode {
    pub const ALL: [SearchMode; 4] = [
        SearchMode::Contains,
        SearchMode::StartsWith,
        SearchMode::EndsWith,
        SearchMode::Exact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Contains => "contains",
            SearchMode::StartsWith => "startsWith",
            SearchMode::EndsWith => "endsWith",
            SearchMode::Exact => "exact",
        }
    }

    /// Parse a wire token.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s.trim())
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search options as declared by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Shortest accepted query, in characters after trimming (default: 1).
    pub min_query_length: usize,

    /// Longest accepted query, in characters after trimming (default: 200).
    pub max_query_length: usize,

    /// Accept `searchFields` to narrow the searched fields.
    pub allow_field_selection: bool,

    /// Default for `caseSensitive`.
    pub case_sensitive: bool,

    /// Accept `useRegex`.
    pub allow_regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_length: 1,
            max_query_length: 200,
            allow_field_selection: false,
            case_sensitive: false,
            allow_regex: false,
        }
    }
}

impl SearchOptions {
    pub fn query_length(mut self, min: usize, max: usize) -> Self {
        self.min_query_length = min;
        self.max_query_length = max;
        self
    }

    pub fn allow_field_selection(mut self) -> Self {
        self.allow_field_selection = true;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn allow_regex(mut self) -> Self {
        self.allow_regex = true;
        self
    }
}

/// Validated search descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchConfig {
    fields: Vec<String>,
    min_query_length: usize,
    max_query_length: usize,
    allow_field_selection: bool,
    case_sensitive: bool,
    allow_regex: bool,
}

impl SearchConfig {
    /// Searchable fields; may be empty when the service searches a fixed index.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn min_query_length(&self) -> usize {
        self.min_query_length
    }

    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    pub fn allow_field_selection(&self) -> bool {
        self.allow_field_selection
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn allow_regex(&self) -> bool {
        self.allow_regex
    }
}

impl QueryModule for SearchConfig {
    fn module(&self) -> ModuleKind {
        ModuleKind::Search
    }

    fn input_fields(&self) -> Vec<InputField> {
        vec![
            InputField::new(
                "query",
                ModuleKind::Search,
                InputSpec::SearchQuery {
                    min_length: self.min_query_length,
                    max_length: self.max_query_length,
                },
            ),
            InputField::new(
                "searchFields",
                ModuleKind::Search,
                InputSpec::NameList {
                    allowed: self.fields.clone(),
                },
            )
            .with_default(json!(self.fields)),
            InputField::new(
                "mode",
                ModuleKind::Search,
                InputSpec::Choice {
                    values: SearchMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
                },
            )
            .with_default(json!(SearchMode::default().as_str())),
            InputField::new("useRegex", ModuleKind::Search, InputSpec::Flag)
                .with_default(json!(false)),
            InputField::new("caseSensitive", ModuleKind::Search, InputSpec::Flag)
                .with_default(json!(self.case_sensitive)),
        ]
    }
}

/// Build a search descriptor.
pub fn build_search_config<I, S>(
    searchable_fields: I,
    options: SearchOptions,
) -> Result<SearchConfig, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields = collect_field_names("search", searchable_fields)?;

    if options.allow_field_selection && fields.is_empty() {
        return Err(ConfigError::EmptyFieldSet {
            module: "search",
            what: "searchable field when field selection is allowed",
        });
    }
    if options.min_query_length > options.max_query_length {
        return Err(ConfigError::InvalidBounds {
            module: "search",
            detail: format!(
                "min_query_length ({}) exceeds max_query_length ({})",
                options.min_query_length, options.max_query_length
            ),
        });
    }

    Ok(SearchConfig {
        fields,
        min_query_length: options.min_query_length,
        max_query_length: options.max_query_length,
        allow_field_selection: options.allow_field_selection,
        case_sensitive: options.case_sensitive,
        allow_regex: options.allow_regex,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_allowed_without_selection() {
        let config = build_search_config(Vec::<String>::new(), SearchOptions::default()).unwrap();
        assert!(config.fields().is_empty());
        assert_eq!(config.min_query_length(), 1);
        assert_eq!(config.max_query_length(), 200);
    }

    #[test]
    fn field_selection_requires_fields() {
        let err = build_search_config(
            Vec::<String>::new(),
            SearchOptions::default().allow_field_selection(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFieldSet { module: "search", .. }));
    }

    #[test]
    fn min_above_max_rejected() {
        let err = build_search_config(["name"], SearchOptions::default().query_length(10, 5))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { module: "search", .. }));
    }

    #[test]
    fn zero_length_queries_allowed() {
        let config =
            build_search_config(["name"], SearchOptions::default().query_length(0, 0)).unwrap();
        assert_eq!(config.max_query_length(), 0);
    }

    #[test]
    fn mode_tokens() {
        assert_eq!(SearchMode::parse("startsWith"), Some(SearchMode::StartsWith));
        assert_eq!(SearchMode::parse("fuzzy"), None);
        assert_eq!(
            serde_json::to_value(SearchMode::EndsWith).unwrap(),
            serde_json::json!("endsWith")
        );
    }

    #[test]
    fn publishes_five_wire_fields() {
        let config = build_search_config(["name", "email"], SearchOptions::default()).unwrap();
        let names: Vec<String> = config.input_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["query", "searchFields", "mode", "useRegex", "caseSensitive"]
        );
    }
}
