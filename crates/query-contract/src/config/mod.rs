//! Config builders.
//!
//! One builder per query module. Each validates its own options at
//! declaration time and returns an immutable descriptor:
//! - `build_pagination_config`: limit bounds and enabled pagination modes
//! - `build_sorting_config`: sortable fields and default ordering
//! - `build_filtering_config`: filterable fields, operators, and value shapes
//! - `build_search_config`: searchable fields and query constraints

mod filtering;
mod pagination;
mod search;
mod sorting;

pub use filtering::{FieldFilterConfig, FieldOptions, FilteringConfig, FilteringOptions, build_filtering_config};
pub use pagination::{PaginationConfig, PaginationMode, PaginationOptions, build_pagination_config};
pub use search::{SearchConfig, SearchMode, SearchOptions, build_search_config};
pub use sorting::{NullsOrder, SortDirection, SortingConfig, SortingOptions, build_sorting_config};

use std::collections::HashSet;

use crate::error::ConfigError;

/// Validate a declared field name.
///
/// Allows alphanumerics, underscores, and dots (for nested paths like
/// `author.name`). Must be non-empty and start with a letter or underscore.
pub(crate) fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Collect declared names, rejecting invalid and duplicate entries.
pub(crate) fn collect_field_names<I, S>(
    module: &'static str,
    names: I,
) -> Result<Vec<String>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for name in names {
        let name = name.into();
        if !is_valid_field_name(&name) {
            return Err(ConfigError::InvalidFieldName {
                module,
                field: name,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateField {
                module,
                field: name,
            });
        }
        fields.push(name);
    }
    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn field_names() {
        assert!(is_valid_field_name("status"));
        assert!(is_valid_field_name("createdAt"));
        assert!(is_valid_field_name("author.name"));
        assert!(is_valid_field_name("_internal"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("1st"));
        assert!(!is_valid_field_name("name; DROP TABLE"));
        assert!(!is_valid_field_name("first name"));
    }

    #[test]
    fn collect_rejects_duplicates() {
        let err = collect_field_names("sorting", ["name", "age", "name"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateField {
                module: "sorting",
                field: "name".to_string()
            }
        );
    }
}
