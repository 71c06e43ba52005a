//! Contract-level behaviour switches.

use serde::{Deserialize, Serialize};

/// What to do with wire keys no module claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Report each unclaimed key as an `UnknownFieldError`.
    #[default]
    Reject,
    /// Drop unclaimed keys silently.
    Ignore,
}

/// Accepted wire shapes for `between` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetweenFormat {
    /// `[from, to]`, or the deprecated `{"from": .., "to": ..}` object.
    #[default]
    TupleOrObject,
    /// `[from, to]` only.
    Tuple,
}

/// Behaviour switches shared by every module of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOptions {
    pub unknown_fields: UnknownFieldPolicy,
    pub between_format: BetweenFormat,

    /// Deepest allowed nesting of `_and` / `_or` groups (default: 4).
    pub max_filter_depth: usize,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
            between_format: BetweenFormat::TupleOrObject,
            max_filter_depth: 4,
        }
    }
}

impl ContractOptions {
    /// Ignore unclaimed wire keys instead of rejecting them.
    pub fn ignore_unknown_fields(mut self) -> Self {
        self.unknown_fields = UnknownFieldPolicy::Ignore;
        self
    }

    pub fn between_format(mut self, format: BetweenFormat) -> Self {
        self.between_format = format;
        self
    }

    pub fn max_filter_depth(mut self, depth: usize) -> Self {
        self.max_filter_depth = depth;
        self
    }
}
