//! Query contract test utilities.
//!
//! Fixture contracts, raw-input builders, and assertion helpers shared by
//! the integration tests.

use query_contract::config::{
    FieldOptions, PaginationMode, PaginationOptions, SearchOptions, SortingOptions,
};
use query_contract::contract::ExtraField;
use query_contract::operator::{FilterOperator, ValueKind};
use query_contract::{ConfigError, QueryBuilder, QueryContract, RawParams};
use serde_json::Value;

/// Turn a `json!` object into raw request parameters.
pub fn params(value: Value) -> RawParams {
    match value {
        Value::Object(map) => map,
        other => panic!("raw params must be a JSON object, got: {other}"),
    }
}

fn built(result: Result<QueryContract, ConfigError>) -> QueryContract {
    match result {
        Ok(contract) => contract,
        Err(e) => panic!("fixture contract is invalid: {e}"),
    }
}

/// Pagination{10, 100}, sorting on name/createdAt (default createdAt), and
/// an `age` number filter limited to `gt`/`lt`.
pub fn users_contract() -> QueryContract {
    built(
        QueryBuilder::new()
            .paginate(PaginationOptions::default().limits(10, 100))
            .sort(
                ["name", "createdAt"],
                SortingOptions::default().default_field("createdAt"),
            )
            .filter(
                "age",
                FieldOptions::new(ValueKind::Number)
                    .operators([FilterOperator::Gt, FilterOperator::Lt]),
            )
            .build(),
    )
}

/// A single `price` number filter with only `between`.
pub fn price_contract() -> QueryContract {
    built(
        QueryBuilder::new()
            .filter(
                "price",
                FieldOptions::new(ValueKind::Number).operators([FilterOperator::Between]),
            )
            .build(),
    )
}

/// Search over name/email with field selection and a 3-character minimum.
pub fn search_contract() -> QueryContract {
    built(
        QueryBuilder::new()
            .search(
                ["name", "email"],
                SearchOptions::default()
                    .allow_field_selection()
                    .query_length(3, 100),
            )
            .build(),
    )
}

/// Every module enabled, with one filter field of each value kind.
pub fn catalog_contract() -> QueryContract {
    built(catalog_builder().build())
}

/// Builder behind [`catalog_contract`], for tests that tweak it.
pub fn catalog_builder() -> QueryBuilder {
    QueryBuilder::new()
        .paginate(PaginationOptions::default().limits(20, 50).modes([
            PaginationMode::Offset,
            PaginationMode::Page,
            PaginationMode::Cursor,
        ]))
        .sort(
            ["name", "price", "created_at"],
            SortingOptions::default()
                .default_field("created_at")
                .allow_multiple()
                .allow_nulls_handling(),
        )
        .filter("name", FieldOptions::new(ValueKind::String))
        .filter(
            "email",
            FieldOptions::new(ValueKind::String)
                .operators([
                    FilterOperator::Eq,
                    FilterOperator::Ilike,
                    FilterOperator::Regex,
                    FilterOperator::IsNull,
                    FilterOperator::IsNotNull,
                ])
                .nullable(),
        )
        .filter("price", FieldOptions::new(ValueKind::Number))
        .filter("active", FieldOptions::new(ValueKind::Boolean))
        .filter("created_at", FieldOptions::new(ValueKind::Date))
        .filter(
            "status",
            FieldOptions::new(ValueKind::Enum(vec![
                "draft".to_string(),
                "active".to_string(),
                "archived".to_string(),
            ])),
        )
        .filter("tags", FieldOptions::new(ValueKind::Array))
        .search(
            ["name", "description"],
            SearchOptions::default().allow_field_selection().allow_regex(),
        )
        .extra(ExtraField::new("include_deleted", ValueKind::Boolean).with_default(false.into()))
}

/// Assertion helpers for validation results.
pub mod assert {
    use query_contract::{FieldErrorKind, QueryRequest, ValidationErrors};

    /// Unwrap a successful validation, listing every error otherwise.
    pub fn valid(result: Result<QueryRequest, ValidationErrors>) -> QueryRequest {
        match result {
            Ok(request) => request,
            Err(errors) => panic!("expected a valid request, got: {errors}"),
        }
    }

    /// Unwrap a failed validation.
    pub fn invalid(result: Result<QueryRequest, ValidationErrors>) -> ValidationErrors {
        match result {
            Ok(request) => panic!("expected validation errors, got: {request:?}"),
            Err(errors) => errors,
        }
    }

    /// Assert that `errors` holds an error of `kind` for `field`.
    pub fn field_error(errors: &ValidationErrors, field: &str, kind: FieldErrorKind) {
        assert!(
            errors.has(field, kind),
            "expected {kind} on '{field}', got: {errors}"
        );
    }
}
