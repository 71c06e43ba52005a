//! Request validation.
//!
//! [`validate`] checks raw request parameters against a [`QueryContract`] and
//! either assembles a typed [`QueryRequest`] or reports every problem found.
//! Modules are checked in a fixed order (pagination, sorting, filtering,
//! search, extra fields, then unclaimed keys) and all errors are collected.

mod filtering;
mod pagination;
mod search;
mod sorting;

use std::collections::{BTreeMap, BTreeSet};

use crate::contract::{QueryContract, UnknownFieldPolicy};
use crate::error::{FieldError, ValidationErrors};
use crate::request::QueryRequest;
use crate::value::{RawParams, Scalar, coerce_scalar};

/// Validate raw request parameters against a contract.
pub fn validate(contract: &QueryContract, raw: &RawParams) -> Result<QueryRequest, ValidationErrors> {
    let mut errors = Vec::new();
    let mut request = QueryRequest::default();

    if let Some(config) = contract.pagination() {
        request.pagination = pagination::validate_pagination(config, raw, &mut errors);
    }

    if let Some(config) = contract.sorting() {
        request.sort = sorting::validate_sorting(config, raw, &mut errors);
    }

    let mut filter_keys = BTreeSet::new();
    if let Some(config) = contract.filtering() {
        let (filters, handled) = filtering::validate_filtering(contract, config, raw, &mut errors);
        request.filters = filters;
        filter_keys = handled;
    }

    if let Some(config) = contract.search() {
        request.search = search::validate_search(config, raw, &mut errors);
    }

    request.extra = validate_extra(contract, raw, &mut errors);

    for key in raw.keys() {
        if contract.input_field(key).is_some() || filter_keys.contains(key.as_str()) {
            continue;
        }
        match contract.options().unknown_fields {
            UnknownFieldPolicy::Reject => {
                errors.push(FieldError::unknown_field(key.as_str(), "unknown query parameter"));
            }
            UnknownFieldPolicy::Ignore => {
                tracing::trace!(key = %key, "ignoring unknown query parameter");
            }
        }
    }

    if errors.is_empty() {
        Ok(request)
    } else {
        tracing::debug!(errors = errors.len(), "query validation failed");
        Err(ValidationErrors::new(errors))
    }
}

fn validate_extra(
    contract: &QueryContract,
    raw: &RawParams,
    errors: &mut Vec<FieldError>,
) -> BTreeMap<String, Scalar> {
    let mut values = BTreeMap::new();
    for field in contract.extra_fields() {
        match raw.get(&field.name) {
            Some(value) => match coerce_scalar(&field.kind, value) {
                Ok(scalar) => {
                    values.insert(field.name.clone(), scalar);
                }
                Err(message) => errors.push(FieldError::type_mismatch(field.name.as_str(), message)),
            },
            None => {
                if let Some(default) = contract.extra_default(&field.name) {
                    values.insert(field.name.clone(), default.clone());
                } else if field.required {
                    errors.push(FieldError::missing(field.name.as_str(), "is required"));
                }
            }
        }
    }
    values
}
