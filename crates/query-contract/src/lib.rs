//! Query Contract Engine
//!
//! Declare once which pagination, sorting, filtering, and search a list
//! endpoint supports, then validate every request's raw parameters against
//! that declaration. Validation yields a typed [`QueryRequest`] or the full
//! list of field errors, and the contract also describes the response
//! metadata shape.
//!
//! ```
//! use query_contract::prelude::*;
//! use serde_json::json;
//!
//! let contract = QueryBuilder::new()
//!     .paginate(PaginationOptions::default())
//!     .sort(["name", "createdAt"], SortingOptions::default().default_field("createdAt"))
//!     .filter("age", FieldOptions::new(ValueKind::Number))
//!     .build()
//!     .unwrap();
//!
//! let raw = from_pairs([("age_gt", "18"), ("limit", "20")]);
//! let request = validate(&contract, &raw).unwrap();
//! assert_eq!(request.limit(), Some(20));
//! assert_eq!(request.filter_count(), 1);
//!
//! let errors = validate(&contract, json!({"age_like": "x"}).as_object().unwrap()).unwrap_err();
//! assert!(errors.has("age_like", FieldErrorKind::UnknownOperator));
//! ```

pub mod builder;
pub mod config;
pub mod contract;
pub mod cursor;
pub mod definition;
pub mod error;
pub mod operator;
pub mod request;
pub mod validate;
pub mod value;

pub use builder::{QueryBuilder, advanced_list, basic_list, searchable_list};
pub use contract::{ContractModules, QueryContract, compose};
pub use error::{ConfigError, FieldError, FieldErrorKind, ValidationErrors};
pub use request::QueryRequest;
pub use validate::validate;
pub use value::{RawParams, from_pairs};

pub mod prelude {
    pub use crate::builder::*;
    pub use crate::config::*;
    pub use crate::contract::*;
    pub use crate::cursor::{Cursor, CursorError};
    pub use crate::definition::{ContractDefinition, load_contract};
    pub use crate::error::*;
    pub use crate::operator::{FilterOperator, ValueKind, ValueShape};
    pub use crate::request::*;
    pub use crate::validate::validate;
    pub use crate::value::{RawParams, Scalar, from_pairs};
}
