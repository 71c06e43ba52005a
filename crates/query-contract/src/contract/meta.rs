//! Response metadata.
//!
//! [`MetaSchema`] is derived from a contract's modules at compose time.
//! [`ResponseMeta`] fills that shape for one validated request and serializes
//! exactly the schema's fields, in schema order.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::QueryContract;
use crate::config::{PaginationConfig, PaginationMode, SortDirection};
use crate::request::{FilterNode, PagePosition, QueryRequest};

/// JSON type of a meta field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaValueKind {
    Integer,
    Boolean,
    String,
    List,
}

/// One field of the response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaField {
    pub name: &'static str,
    pub kind: MetaValueKind,

    /// Whether the value may be `null`.
    pub nullable: bool,
}

impl MetaField {
    const fn new(name: &'static str, kind: MetaValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    const fn nullable(name: &'static str, kind: MetaValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// Output metadata shape of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetaSchema {
    fields: Vec<MetaField>,
}

impl MetaSchema {
    pub(crate) fn build(
        pagination: Option<&PaginationConfig>,
        sorting: bool,
        filtering: bool,
    ) -> Self {
        use MetaValueKind::*;

        let mut fields = vec![
            MetaField::new("total", Integer),
            MetaField::new("limit", Integer),
            MetaField::new("hasMore", Boolean),
        ];
        if let Some(pagination) = pagination {
            for mode in pagination.modes() {
                match mode {
                    PaginationMode::Offset => fields.push(MetaField::new("offset", Integer)),
                    PaginationMode::Page => {
                        fields.push(MetaField::new("page", Integer));
                        fields.push(MetaField::new("totalPages", Integer));
                    }
                    PaginationMode::Cursor => {
                        fields.push(MetaField::nullable("nextCursor", String));
                        fields.push(MetaField::nullable("prevCursor", String));
                    }
                }
            }
        }
        if sorting {
            fields.push(MetaField::nullable("sortBy", String));
            fields.push(MetaField::nullable("sortDirection", String));
        }
        if filtering {
            fields.push(MetaField::new("appliedFilters", List));
            fields.push(MetaField::new("filterCount", Integer));
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[MetaField] {
        &self.fields
    }

    /// Field names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Runtime response metadata for one validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    schema: MetaSchema,
    pub total: u64,
    pub limit: u64,
    pub has_more: bool,
    pub offset: Option<u64>,
    pub page: Option<u64>,
    pub total_pages: u64,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub applied_filters: Vec<FilterNode>,
    cursor_driven: bool,
}

impl ResponseMeta {
    /// Metadata for `request` against a result set of `total` items.
    pub fn new(contract: &QueryContract, request: &QueryRequest, total: u64) -> Self {
        let limit = match request.limit() {
            Some(limit) => u64::from(limit),
            None => total,
        };
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        let (offset, page) = match request.position() {
            Some(PagePosition::Offset(offset)) => {
                let page = if limit == 0 { 1 } else { offset / limit + 1 };
                (Some(*offset), Some(page))
            }
            Some(PagePosition::Page(page)) => {
                let page = u64::from(*page);
                (Some(page.saturating_sub(1).saturating_mul(limit)), Some(page))
            }
            Some(PagePosition::Cursor(_)) => (None, None),
            None if request.pagination.is_some() => (None, None),
            None => (Some(0), Some(1)),
        };

        let cursor_driven = request.pagination.is_some()
            && matches!(request.position(), Some(PagePosition::Cursor(_)) | None);

        let has_more = match request.position() {
            Some(PagePosition::Offset(offset)) => offset.saturating_add(limit) < total,
            Some(PagePosition::Page(page)) => u64::from(*page) < total_pages,
            _ => false,
        };

        Self {
            schema: contract.meta_schema().clone(),
            total,
            limit,
            has_more,
            offset,
            page,
            total_pages,
            next_cursor: None,
            prev_cursor: None,
            sort_by: request.sort_by().map(str::to_string),
            sort_direction: request.sort_direction(),
            applied_filters: request.filters.clone(),
            cursor_driven,
        }
    }

    /// Attach continuation cursors.
    ///
    /// For cursor-positioned requests `hasMore` follows the presence of a
    /// next cursor.
    pub fn with_cursors(mut self, next: Option<String>, prev: Option<String>) -> Self {
        if self.cursor_driven {
            self.has_more = next.is_some();
        }
        self.next_cursor = next;
        self.prev_cursor = prev;
        self
    }

    pub fn filter_count(&self) -> usize {
        self.applied_filters.iter().map(FilterNode::condition_count).sum()
    }

    pub fn schema(&self) -> &MetaSchema {
        &self.schema
    }
}

impl Serialize for ResponseMeta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for field in self.schema.fields() {
            match field.name {
                "total" => map.serialize_entry("total", &self.total)?,
                "limit" => map.serialize_entry("limit", &self.limit)?,
                "hasMore" => map.serialize_entry("hasMore", &self.has_more)?,
                "offset" => map.serialize_entry("offset", &self.offset)?,
                "page" => map.serialize_entry("page", &self.page)?,
                "totalPages" => map.serialize_entry("totalPages", &self.total_pages)?,
                "nextCursor" => map.serialize_entry("nextCursor", &self.next_cursor)?,
                "prevCursor" => map.serialize_entry("prevCursor", &self.prev_cursor)?,
                "sortBy" => map.serialize_entry("sortBy", &self.sort_by)?,
                "sortDirection" => map.serialize_entry("sortDirection", &self.sort_direction)?,
                "appliedFilters" => map.serialize_entry("appliedFilters", &self.applied_filters)?,
                "filterCount" => map.serialize_entry("filterCount", &self.filter_count())?,
                _ => {}
            }
        }
        map.end()
    }
}

/// Response envelope for list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: ResponseMeta,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, meta: ResponseMeta) -> Self {
        Self { data, meta }
    }
}
