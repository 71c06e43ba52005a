use regex::Regex;

use crate::config::{SearchConfig, SearchMode};
use crate::error::FieldError;
use crate::request::SearchRequest;
use crate::value::{RawParams, as_list, coerce_bool, coerce_text};

const SEARCH_KEYS: [&str; 5] = ["query", "searchFields", "mode", "useRegex", "caseSensitive"];

fn flag(key: &str, raw: &RawParams, default: bool, errors: &mut Vec<FieldError>) -> Option<bool> {
    match raw.get(key).map(coerce_bool) {
        None => Some(default),
        Some(Ok(flag)) => Some(flag),
        Some(Err(message)) => {
            errors.push(FieldError::type_mismatch(key, message));
            None
        }
    }
}

/// Validate the search keys. Returns `None` when no search key is present.
pub(super) fn validate_search(
    config: &SearchConfig,
    raw: &RawParams,
    errors: &mut Vec<FieldError>,
) -> Option<SearchRequest> {
    if !SEARCH_KEYS.iter().any(|key| raw.contains_key(*key)) {
        return None;
    }
    let before = errors.len();

    let query = match raw.get("query").map(coerce_text) {
        None => {
            errors.push(FieldError::missing(
                "query",
                "a search query is required when any search parameter is given",
            ));
            None
        }
        Some(Err(message)) => {
            errors.push(FieldError::type_mismatch("query", message));
            None
        }
        Some(Ok(text)) => {
            let query = text.trim().to_string();
            let length = query.chars().count();
            if length < config.min_query_length() || length > config.max_query_length() {
                errors.push(FieldError::query_length(
                    "query",
                    format!(
                        "must be between {} and {} characters, got {length}",
                        config.min_query_length(),
                        config.max_query_length()
                    ),
                ));
                None
            } else {
                Some(query)
            }
        }
    };

    let fields = match raw.get("searchFields") {
        None => config.fields().to_vec(),
        Some(_) if !config.allow_field_selection() => {
            errors.push(FieldError::unknown_field(
                "searchFields",
                "search field selection is not enabled",
            ));
            Vec::new()
        }
        Some(value) => match as_list(value) {
            Ok(items) => {
                let mut fields = Vec::with_capacity(items.len());
                for item in &items {
                    let name = match coerce_text(item) {
                        Ok(name) => name,
                        Err(message) => {
                            errors.push(FieldError::type_mismatch("searchFields", message));
                            continue;
                        }
                    };
                    if config.fields().contains(&name) {
                        if !fields.contains(&name) {
                            fields.push(name);
                        }
                    } else {
                        errors.push(FieldError::unknown_field(
                            "searchFields",
                            format!(
                                "'{name}' is not searchable; searchable fields: {}",
                                config.fields().join(", ")
                            ),
                        ));
                    }
                }
                fields
            }
            Err(message) => {
                errors.push(FieldError::type_mismatch("searchFields", message));
                Vec::new()
            }
        },
    };

    let mode = match raw.get("mode").map(coerce_text) {
        None => SearchMode::default(),
        Some(Ok(text)) => SearchMode::parse(&text).unwrap_or_else(|| {
            errors.push(FieldError::type_mismatch(
                "mode",
                format!("expected one of contains, startsWith, endsWith, exact, got '{text}'"),
            ));
            SearchMode::default()
        }),
        Some(Err(message)) => {
            errors.push(FieldError::type_mismatch("mode", message));
            SearchMode::default()
        }
    };

    let use_regex = if raw.contains_key("useRegex") && !config.allow_regex() {
        errors.push(FieldError::unknown_field("useRegex", "regex search is not enabled"));
        false
    } else {
        flag("useRegex", raw, false, errors).unwrap_or_default()
    };
    let case_sensitive = flag("caseSensitive", raw, config.case_sensitive(), errors)
        .unwrap_or(config.case_sensitive());

    if use_regex
        && let Some(pattern) = &query
        && let Err(e) = Regex::new(pattern)
    {
        errors.push(FieldError::type_mismatch(
            "query",
            format!("invalid regular expression: {e}"),
        ));
    }

    if errors.len() > before {
        return None;
    }
    Some(SearchRequest {
        query: query?,
        fields,
        mode,
        case_sensitive,
        use_regex,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{SearchOptions, build_search_config};
    use crate::error::FieldErrorKind;
    use serde_json::{Value, json};

    fn run(options: SearchOptions, input: Value) -> (Option<SearchRequest>, Vec<FieldError>) {
        let config = build_search_config(["name", "email"], options).unwrap();
        let Value::Object(raw) = input else {
            panic!("expected an object");
        };
        let mut errors = Vec::new();
        let result = validate_search(&config, &raw, &mut errors);
        (result, errors)
    }

    #[test]
    fn absent_search_is_none() {
        let (result, errors) = run(SearchOptions::default(), json!({"limit": 5}));
        assert!(result.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn query_is_trimmed_and_defaults_applied() {
        let (result, errors) = run(SearchOptions::default(), json!({"query": "  widget  "}));
        assert!(errors.is_empty());
        let result = result.unwrap();
        assert_eq!(result.query, "widget");
        assert_eq!(result.fields, vec!["name", "email"]);
        assert_eq!(result.mode, SearchMode::Contains);
        assert!(!result.case_sensitive);
        assert!(!result.use_regex);
    }

    #[test]
    fn mode_without_query_is_missing_required() {
        let (_, errors) = run(SearchOptions::default(), json!({"mode": "exact"}));
        assert_eq!(errors[0].field, "query");
        assert_eq!(errors[0].kind, FieldErrorKind::MissingRequiredField);
    }

    #[test]
    fn length_counted_after_trim() {
        let options = SearchOptions::default().query_length(3, 10);
        let (_, errors) = run(options, json!({"query": " ab "}));
        assert_eq!(errors[0].kind, FieldErrorKind::QueryLength);
    }

    #[test]
    fn field_selection_disabled() {
        let (_, errors) = run(
            SearchOptions::default(),
            json!({"query": "abc", "searchFields": ["name"]}),
        );
        assert_eq!(errors[0].field, "searchFields");
        assert_eq!(errors[0].kind, FieldErrorKind::UnknownField);
    }

    #[test]
    fn selected_fields_must_be_text() {
        let (result, errors) = run(
            SearchOptions::default().allow_field_selection(),
            json!({"query": "abc", "searchFields": [{"a": 1}]}),
        );
        assert!(result.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "searchFields");
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn selected_fields_are_deduplicated() {
        let (result, errors) = run(
            SearchOptions::default().allow_field_selection(),
            json!({"query": "abc", "searchFields": "email,email,name"}),
        );
        assert!(errors.is_empty());
        assert_eq!(result.unwrap().fields, vec!["email", "name"]);
    }

    #[test]
    fn regex_requires_option_and_valid_pattern() {
        let (_, errors) = run(
            SearchOptions::default(),
            json!({"query": "a.*", "useRegex": true}),
        );
        assert_eq!(errors[0].field, "useRegex");
        assert_eq!(errors[0].kind, FieldErrorKind::UnknownField);

        let (_, errors) = run(
            SearchOptions::default().allow_regex(),
            json!({"query": "(unclosed", "useRegex": "true"}),
        );
        assert_eq!(errors[0].field, "query");
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);

        let (result, errors) = run(
            SearchOptions::default().allow_regex(),
            json!({"query": "^wid", "useRegex": true}),
        );
        assert!(errors.is_empty());
        assert!(result.unwrap().use_regex);
    }

    #[test]
    fn unknown_mode() {
        let (_, errors) = run(SearchOptions::default(), json!({"query": "abc", "mode": "fuzzy"}));
        assert_eq!(errors[0].field, "mode");
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn case_sensitive_default_from_config() {
        let (result, _) = run(SearchOptions::default().case_sensitive(), json!({"query": "abc"}));
        assert!(result.unwrap().case_sensitive);
    }
}
