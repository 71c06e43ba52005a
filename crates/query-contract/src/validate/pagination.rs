use serde_json::Value;

use crate::config::{PaginationConfig, PaginationMode};
use crate::error::FieldError;
use crate::request::{PagePosition, PageRequest};
use crate::value::{RawParams, coerce_integer, coerce_text};

fn integer_in_range(
    key: &str,
    value: &Value,
    min: i64,
    max: i64,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let n = match coerce_integer(value) {
        Ok(n) => n,
        Err(message) => {
            errors.push(FieldError::type_mismatch(key, message));
            return None;
        }
    };
    if n < min || n > max {
        let message = if max == i64::MAX {
            format!("must be at least {min}, got {n}")
        } else {
            format!("must be between {min} and {max}, got {n}")
        };
        errors.push(FieldError::out_of_range(key, message));
        return None;
    }
    Some(n)
}

fn position(
    mode: PaginationMode,
    value: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<PagePosition> {
    let key = mode.wire_name();
    match mode {
        PaginationMode::Offset => integer_in_range(key, value, 0, i64::MAX, errors)
            .and_then(|n| u64::try_from(n).ok())
            .map(PagePosition::Offset),
        PaginationMode::Page => integer_in_range(key, value, 1, i64::from(u32::MAX), errors)
            .and_then(|n| u32::try_from(n).ok())
            .map(PagePosition::Page),
        PaginationMode::Cursor => match coerce_text(value) {
            Ok(cursor) if !cursor.trim().is_empty() => Some(PagePosition::Cursor(cursor)),
            Ok(_) => {
                errors.push(FieldError::type_mismatch(key, "must be a non-empty string"));
                None
            }
            Err(message) => {
                errors.push(FieldError::type_mismatch(key, message));
                None
            }
        },
    }
}

/// Validate `limit` and the position keys.
///
/// At most one of the enabled position keys may be supplied; each extra one
/// is reported against its own key.
pub(super) fn validate_pagination(
    config: &PaginationConfig,
    raw: &RawParams,
    errors: &mut Vec<FieldError>,
) -> Option<PageRequest> {
    let limit = match raw.get("limit") {
        Some(value) => integer_in_range(
            "limit",
            value,
            i64::from(config.min_limit()),
            i64::from(config.max_limit()),
            errors,
        )
        .and_then(|n| u32::try_from(n).ok()),
        None => Some(config.default_limit()),
    };

    let supplied: Vec<(PaginationMode, &Value)> = config
        .modes()
        .filter_map(|mode| raw.get(mode.wire_name()).map(|value| (mode, value)))
        .collect();

    let mut exclusive_ok = true;
    if let Some(((first, _), rest)) = supplied.split_first() {
        for (mode, _) in rest {
            exclusive_ok = false;
            errors.push(FieldError::exclusive(
                mode.wire_name(),
                format!("cannot be combined with '{}'", first.wire_name()),
            ));
        }
    }

    let position = match supplied.first() {
        Some((mode, value)) => {
            let position = position(*mode, value, errors);
            if position.is_none() {
                return None;
            }
            position
        }
        None => match config.default_mode() {
            Some(PaginationMode::Offset) => Some(PagePosition::Offset(0)),
            Some(PaginationMode::Page) => Some(PagePosition::Page(1)),
            _ => None,
        },
    };

    if !exclusive_ok {
        return None;
    }
    limit.map(|limit| PageRequest { limit, position })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{PaginationOptions, build_pagination_config};
    use crate::error::FieldErrorKind;
    use serde_json::json;

    fn raw(value: Value) -> RawParams {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn run(options: PaginationOptions, input: Value) -> (Option<PageRequest>, Vec<FieldError>) {
        let config = build_pagination_config(options).unwrap();
        let mut errors = Vec::new();
        let result = validate_pagination(&config, &raw(input), &mut errors);
        (result, errors)
    }

    #[test]
    fn defaults_limit_and_offset() {
        let (result, errors) = run(PaginationOptions::default(), json!({}));
        assert!(errors.is_empty());
        assert_eq!(
            result,
            Some(PageRequest {
                limit: 10,
                position: Some(PagePosition::Offset(0)),
            })
        );
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let (result, errors) =
            run(PaginationOptions::default(), json!({"limit": "25", "offset": "40"}));
        assert!(errors.is_empty(), "{errors:?}");
        let result = result.unwrap();
        assert_eq!(result.limit, 25);
        assert_eq!(result.position, Some(PagePosition::Offset(40)));
    }

    #[test]
    fn non_numeric_limit_is_type_mismatch() {
        let (result, errors) = run(PaginationOptions::default(), json!({"limit": "ten"}));
        assert!(result.is_none());
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn negative_offset_out_of_range() {
        let (_, errors) = run(PaginationOptions::default(), json!({"offset": -1}));
        assert_eq!(errors[0].field, "offset");
        assert_eq!(errors[0].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn page_zero_out_of_range() {
        let options = PaginationOptions::default().modes([PaginationMode::Page]);
        let (_, errors) = run(options, json!({"page": 0}));
        assert_eq!(errors[0].field, "page");
        assert_eq!(errors[0].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn cursor_and_offset_are_exclusive() {
        let options =
            PaginationOptions::default().modes([PaginationMode::Offset, PaginationMode::Cursor]);
        let (result, errors) = run(options, json!({"offset": 10, "cursor": "abc"}));
        assert!(result.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cursor");
        assert_eq!(errors[0].kind, FieldErrorKind::ExclusiveModeViolation);
    }

    #[test]
    fn either_mode_alone_is_accepted() {
        let options =
            PaginationOptions::default().modes([PaginationMode::Offset, PaginationMode::Cursor]);
        let (result, _) = run(options.clone(), json!({"cursor": "abc"}));
        assert_eq!(result.unwrap().position, Some(PagePosition::Cursor("abc".to_string())));
        let (result, _) = run(options, json!({"offset": 5}));
        assert_eq!(result.unwrap().position, Some(PagePosition::Offset(5)));
    }

    #[test]
    fn empty_cursor_rejected() {
        let options = PaginationOptions::default().modes([PaginationMode::Cursor]);
        let (_, errors) = run(options, json!({"cursor": "  "}));
        assert_eq!(errors[0].kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn cursor_only_has_no_default_position() {
        let options = PaginationOptions::default().modes([PaginationMode::Cursor]);
        let (result, errors) = run(options, json!({}));
        assert!(errors.is_empty());
        assert_eq!(result.unwrap().position, None);
    }

    #[test]
    fn zero_min_limit_accepts_zero() {
        let options = PaginationOptions::default().min_limit(0);
        let (result, errors) = run(options, json!({"limit": 0}));
        assert!(errors.is_empty());
        assert_eq!(result.unwrap().limit, 0);
    }
}
