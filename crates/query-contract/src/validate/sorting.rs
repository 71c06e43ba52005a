use serde_json::Value;

use crate::config::{NullsOrder, SortDirection, SortingConfig};
use crate::error::FieldError;
use crate::request::SortSpec;
use crate::value::{RawParams, as_list, coerce_text, describe, parse_embedded};

/// Request-level direction and nulls, applied to entries that name neither.
struct Defaults {
    direction: SortDirection,
    nulls: Option<NullsOrder>,
}

fn sortable_field(
    config: &SortingConfig,
    key: &str,
    value: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let field = match coerce_text(value) {
        Ok(field) => field.trim().to_string(),
        Err(message) => {
            errors.push(FieldError::type_mismatch(key, message));
            return None;
        }
    };
    if !config.is_sortable(&field) {
        errors.push(FieldError::unknown_field(
            key,
            format!(
                "cannot sort by '{field}'; sortable fields: {}",
                config.fields().join(", ")
            ),
        ));
        return None;
    }
    Some(field)
}

fn direction(key: &str, value: &Value, errors: &mut Vec<FieldError>) -> Option<SortDirection> {
    match coerce_text(value).and_then(|s| s.parse::<SortDirection>()) {
        Ok(direction) => Some(direction),
        Err(message) => {
            errors.push(FieldError::type_mismatch(key, message));
            None
        }
    }
}

fn nulls(
    config: &SortingConfig,
    key: &str,
    value: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<NullsOrder> {
    if !config.allow_nulls_handling() {
        errors.push(FieldError::unknown_field(key, "nulls handling is not enabled"));
        return None;
    }
    match coerce_text(value).and_then(|s| s.parse::<NullsOrder>()) {
        Ok(nulls) => Some(nulls),
        Err(message) => {
            errors.push(FieldError::type_mismatch(key, message));
            None
        }
    }
}

/// One sort entry: a field name or a `{field, direction, nulls}` object.
fn sort_entry(
    config: &SortingConfig,
    key: &str,
    value: &Value,
    defaults: &Defaults,
    errors: &mut Vec<FieldError>,
) -> Option<SortSpec> {
    let Value::Object(entry) = value else {
        return sortable_field(config, key, value, errors).map(|field| SortSpec {
            field,
            direction: defaults.direction,
            nulls: defaults.nulls,
        });
    };

    let before = errors.len();
    for name in entry.keys() {
        if !matches!(name.as_str(), "field" | "direction" | "nulls") {
            errors.push(FieldError::unknown_field(
                format!("{key}.{name}"),
                "expected only field, direction, and nulls",
            ));
        }
    }

    let field = match entry.get("field") {
        Some(field) => sortable_field(config, &format!("{key}.field"), field, errors),
        None => {
            errors.push(FieldError::type_mismatch(key, "sort entry requires a 'field'"));
            None
        }
    };
    let direction = match entry.get("direction") {
        Some(value) => direction(&format!("{key}.direction"), value, errors),
        None => Some(defaults.direction),
    };
    let nulls = match entry.get("nulls") {
        Some(value) => nulls(config, &format!("{key}.nulls"), value, errors),
        None => defaults.nulls,
    };

    if errors.len() > before {
        return None;
    }
    Some(SortSpec {
        field: field?,
        direction: direction?,
        nulls,
    })
}

pub(super) fn validate_sorting(
    config: &SortingConfig,
    raw: &RawParams,
    errors: &mut Vec<FieldError>,
) -> Vec<SortSpec> {
    let before = errors.len();

    let direction = match raw.get("sortDirection") {
        Some(value) => direction("sortDirection", value, errors),
        None => Some(config.default_direction()),
    };
    let nulls = raw
        .get("nullsHandling")
        .and_then(|value| nulls(config, "nullsHandling", value, errors));
    let defaults = Defaults {
        direction: direction.unwrap_or(config.default_direction()),
        nulls,
    };

    let Some(sort_by) = raw.get("sortBy") else {
        return match config.default_field() {
            Some(field) => vec![SortSpec {
                field: field.to_string(),
                direction: defaults.direction,
                nulls: defaults.nulls,
            }],
            None => {
                if raw.contains_key("sortDirection") || raw.contains_key("nullsHandling") {
                    errors.push(FieldError::missing(
                        "sortBy",
                        "a sort field is required when a sort direction is given",
                    ));
                }
                Vec::new()
            }
        };
    };

    let parsed = parse_embedded(sort_by);
    let mut specs = Vec::new();
    match parsed.as_ref() {
        Value::Array(_) if !config.allow_multiple() => {
            errors.push(FieldError::type_mismatch(
                "sortBy",
                "sorting by multiple fields is not enabled",
            ));
        }
        value if !config.allow_multiple() => {
            specs.extend(sort_entry(config, "sortBy", value, &defaults, errors));
        }
        value @ Value::Object(_) => {
            specs.extend(sort_entry(config, "sortBy", value, &defaults, errors));
        }
        value => match as_list(value) {
            Ok(items) => {
                for (i, item) in items.iter().enumerate() {
                    let key = format!("sortBy[{i}]");
                    let Some(spec) = sort_entry(config, &key, item, &defaults, errors) else {
                        continue;
                    };
                    if specs.iter().any(|s: &SortSpec| s.field == spec.field) {
                        errors.push(FieldError::type_mismatch(
                            key,
                            format!("'{}' is already sorted on", spec.field),
                        ));
                        continue;
                    }
                    specs.push(spec);
                }
            }
            Err(message) => errors.push(FieldError::type_mismatch(
                "sortBy",
                format!("{message} (got {})", describe(value)),
            )),
        },
    }

    if errors.len() > before {
        return Vec::new();
    }
    specs
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{SortingOptions, build_sorting_config};
    use crate::error::FieldErrorKind;
    use serde_json::json;

    fn run(options: SortingOptions, input: Value) -> (Vec<SortSpec>, Vec<FieldError>) {
        let config = build_sorting_config(["name", "createdAt", "price"], options).unwrap();
        let Value::Object(raw) = input else {
            panic!("expected an object");
        };
        let mut errors = Vec::new();
        let specs = validate_sorting(&config, &raw, &mut errors);
        (specs, errors)
    }

    #[test]
    fn default_field_applied() {
        let (specs, errors) = run(SortingOptions::default().default_field("createdAt"), json!({}));
        assert!(errors.is_empty());
        assert_eq!(specs[0].field, "createdAt");
        assert_eq!(specs[0].direction, SortDirection::Asc);
    }

    #[test]
    fn no_default_no_sort() {
        let (specs, errors) = run(SortingOptions::default(), json!({}));
        assert!(errors.is_empty());
        assert!(specs.is_empty());
    }

    #[test]
    fn unknown_sort_field() {
        let (_, errors) = run(SortingOptions::default(), json!({"sortBy": "password"}));
        assert_eq!(errors[0].field, "sortBy");
        assert_eq!(errors[0].kind, FieldErrorKind::UnknownField);
    }

    #[test]
    fn bad_direction() {
        let (_, errors) = run(
            SortingOptions::default(),
            json!({"sortBy": "name", "sortDirection": "sideways"}),
        );
        assert_eq!(errors[0].field, "sortDirection");
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn arrays_need_multiple() {
        let (_, errors) = run(SortingOptions::default(), json!({"sortBy": ["name", "price"]}));
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn multiple_entries_in_order() {
        let (specs, errors) = run(
            SortingOptions::default().allow_multiple(),
            json!({
                "sortBy": [{"field": "price", "direction": "desc"}, "name"],
                "sortDirection": "asc"
            }),
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].field, "price");
        assert_eq!(specs[0].direction, SortDirection::Desc);
        assert_eq!(specs[1].field, "name");
        assert_eq!(specs[1].direction, SortDirection::Asc);
    }

    #[test]
    fn multiple_from_comma_string() {
        let (specs, errors) = run(
            SortingOptions::default().allow_multiple(),
            json!({"sortBy": "name,price"}),
        );
        assert!(errors.is_empty());
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn every_bad_entry_reported() {
        let (specs, errors) = run(
            SortingOptions::default().allow_multiple(),
            json!({"sortBy": ["ssn", {"field": "name", "direction": "up"}]}),
        );
        assert!(specs.is_empty());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "sortBy[0]");
        assert_eq!(errors[1].field, "sortBy[1].direction");
    }

    #[test]
    fn repeated_sort_field_rejected() {
        let (specs, errors) = run(
            SortingOptions::default().allow_multiple(),
            json!({"sortBy": ["name", "price", {"field": "name", "direction": "desc"}]}),
        );
        assert!(specs.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sortBy[2]");
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);

        let (_, errors) = run(
            SortingOptions::default().allow_multiple(),
            json!({"sortBy": "name,name"}),
        );
        assert_eq!(errors[0].field, "sortBy[1]");
    }

    #[test]
    fn nulls_handling_requires_option() {
        let (_, errors) = run(
            SortingOptions::default(),
            json!({"sortBy": "name", "nullsHandling": "last"}),
        );
        assert_eq!(errors[0].field, "nullsHandling");
        assert_eq!(errors[0].kind, FieldErrorKind::UnknownField);

        let (specs, errors) = run(
            SortingOptions::default().allow_nulls_handling(),
            json!({"sortBy": "name", "nullsHandling": "last"}),
        );
        assert!(errors.is_empty());
        assert_eq!(specs[0].nulls, Some(NullsOrder::Last));
    }

    #[test]
    fn direction_without_field() {
        let (_, errors) = run(SortingOptions::default(), json!({"sortDirection": "desc"}));
        assert_eq!(errors[0].field, "sortBy");
        assert_eq!(errors[0].kind, FieldErrorKind::MissingRequiredField);
    }
}
