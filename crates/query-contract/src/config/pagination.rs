//! Pagination module: limit bounds and position modes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contract::{InputField, InputSpec, ModuleKind, QueryModule};
use crate::error::ConfigError;

/// How a client positions itself in a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// Number of items to skip.
    Offset,
    /// 1-indexed page number.
    Page,
    /// Opaque continuation token.
    Cursor,
}

impl PaginationMode {
    /// Wire key that carries this mode's position.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PaginationMode::Offset => "offset",
            PaginationMode::Page => "page",
            PaginationMode::Cursor => "cursor",
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Pagination options as declared by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Limit used when the request supplies none (default: 10).
    pub default_limit: u32,

    /// Largest accepted limit (default: 100).
    pub max_limit: u32,

    /// Smallest accepted limit (default: 1).
    pub min_limit: u32,

    /// Enabled position modes (default: offset only).
    pub modes: Vec<PaginationMode>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            min_limit: 1,
            modes: vec![PaginationMode::Offset],
        }
    }
}

impl PaginationOptions {
    /// Set the default and maximum limits.
    pub fn limits(mut self, default_limit: u32, max_limit: u32) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Set the minimum limit.
    pub fn min_limit(mut self, min_limit: u32) -> Self {
        self.min_limit = min_limit;
        self
    }

    /// Replace the enabled modes.
    pub fn modes(mut self, modes: impl IntoIterator<Item = PaginationMode>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }
}

/// Validated pagination descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationConfig {
    default_limit: u32,
    max_limit: u32,
    min_limit: u32,
    modes: BTreeSet<PaginationMode>,
}

impl PaginationConfig {
    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    pub fn min_limit(&self) -> u32 {
        self.min_limit
    }

    /// Enabled modes in precedence order (offset, page, cursor).
    pub fn modes(&self) -> impl Iterator<Item = PaginationMode> + '_ {
        self.modes.iter().copied()
    }

    pub fn has_mode(&self, mode: PaginationMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Mode whose position is defaulted when a request supplies none.
    /// `None` for cursor-only contracts.
    pub fn default_mode(&self) -> Option<PaginationMode> {
        self.modes().find(|m| *m != PaginationMode::Cursor)
    }
}

impl QueryModule for PaginationConfig {
    fn module(&self) -> ModuleKind {
        ModuleKind::Pagination
    }

    fn input_fields(&self) -> Vec<InputField> {
        let mut fields = vec![
            InputField::new(
                "limit",
                ModuleKind::Pagination,
                InputSpec::Integer {
                    min: i64::from(self.min_limit),
                    max: Some(i64::from(self.max_limit)),
                },
            )
            .with_default(json!(self.default_limit)),
        ];

        let default_mode = self.default_mode();
        for mode in self.modes() {
            let field = match mode {
                PaginationMode::Offset => InputField::new(
                    "offset",
                    ModuleKind::Pagination,
                    InputSpec::Integer { min: 0, max: None },
                ),
                PaginationMode::Page => InputField::new(
                    "page",
                    ModuleKind::Pagination,
                    InputSpec::Integer { min: 1, max: None },
                ),
                PaginationMode::Cursor => {
                    InputField::new("cursor", ModuleKind::Pagination, InputSpec::Text)
                }
            };
            let field = match (default_mode == Some(mode), mode) {
                (true, PaginationMode::Offset) => field.with_default(json!(0)),
                (true, PaginationMode::Page) => field.with_default(json!(1)),
                _ => field,
            };
            fields.push(field);
        }
        fields
    }
}

/// Build a pagination descriptor, filling defaults and checking bounds.
pub fn build_pagination_config(options: PaginationOptions) -> Result<PaginationConfig, ConfigError> {
    let PaginationOptions {
        default_limit,
        max_limit,
        min_limit,
        modes,
    } = options;

    if min_limit > max_limit {
        return Err(ConfigError::InvalidBounds {
            module: "pagination",
            detail: format!("min_limit ({min_limit}) exceeds max_limit ({max_limit})"),
        });
    }
    if default_limit < min_limit || default_limit > max_limit {
        return Err(ConfigError::InvalidBounds {
            module: "pagination",
            detail: format!(
                "default_limit ({default_limit}) must be within {min_limit}..={max_limit}"
            ),
        });
    }

    let modes: BTreeSet<PaginationMode> = modes.into_iter().collect();
    if modes.is_empty() {
        return Err(ConfigError::EmptyFieldSet {
            module: "pagination",
            what: "mode",
        });
    }

    Ok(PaginationConfig {
        default_limit,
        max_limit,
        min_limit,
        modes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = build_pagination_config(PaginationOptions::default()).unwrap();
        assert_eq!(config.default_limit(), 10);
        assert_eq!(config.max_limit(), 100);
        assert_eq!(config.min_limit(), 1);
        assert_eq!(config.modes().collect::<Vec<_>>(), vec![PaginationMode::Offset]);
    }

    #[test]
    fn rejects_default_above_max() {
        let err = build_pagination_config(PaginationOptions::default().limits(500, 100)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { .. }), "{err}");
    }

    #[test]
    fn rejects_min_above_max() {
        let options = PaginationOptions {
            default_limit: 5,
            max_limit: 5,
            min_limit: 6,
            ..Default::default()
        };
        assert!(build_pagination_config(options).is_err());
    }

    #[test]
    fn rejects_empty_modes() {
        let options = PaginationOptions::default().modes([]);
        let err = build_pagination_config(options).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyFieldSet {
                module: "pagination",
                what: "mode"
            }
        );
    }

    #[test]
    fn identical_options_build_equal_descriptors() {
        let options = PaginationOptions::default()
            .modes([PaginationMode::Cursor, PaginationMode::Page, PaginationMode::Cursor]);
        let a = build_pagination_config(options.clone()).unwrap();
        let b = build_pagination_config(options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.default_mode(), Some(PaginationMode::Page));
    }

    #[test]
    fn wire_fields_follow_modes() {
        let config = build_pagination_config(
            PaginationOptions::default().modes([PaginationMode::Offset, PaginationMode::Cursor]),
        )
        .unwrap();
        let names: Vec<String> = config.input_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["limit", "offset", "cursor"]);
    }

    #[test]
    fn cursor_only_has_no_default_position() {
        let config =
            build_pagination_config(PaginationOptions::default().modes([PaginationMode::Cursor]))
                .unwrap();
        assert_eq!(config.default_mode(), None);
    }
}
