//! Fluent contract builder and common list presets.

use crate::config::{
    FieldOptions, FilteringOptions, PaginationMode, PaginationOptions, SearchOptions,
    SortingOptions, build_filtering_config, build_pagination_config, build_search_config,
    build_sorting_config,
};
use crate::contract::{ContractModules, ContractOptions, ExtraField, QueryContract, compose};
use crate::error::ConfigError;

/// Fluent builder for a [`QueryContract`].
///
/// Collects module options and runs every config builder plus [`compose`]
/// on [`build`](QueryBuilder::build), so the first declaration error is
/// reported there.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pagination: Option<PaginationOptions>,
    sorting: Option<(Vec<String>, SortingOptions)>,
    filter_fields: Vec<(String, FieldOptions)>,
    filtering: Option<FilteringOptions>,
    search: Option<(Vec<String>, SearchOptions)>,
    extra_fields: Vec<ExtraField>,
    options: ContractOptions,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pagination.
    pub fn paginate(mut self, options: PaginationOptions) -> Self {
        self.pagination = Some(options);
        self
    }

    /// Enable sorting on `fields`.
    pub fn sort<I, S>(mut self, fields: I, options: SortingOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sorting = Some((fields.into_iter().map(Into::into).collect(), options));
        self
    }

    /// Add a filterable field. Enables filtering with default options.
    pub fn filter(mut self, field: impl Into<String>, options: FieldOptions) -> Self {
        self.filter_fields.push((field.into(), options));
        self.filtering.get_or_insert_with(FilteringOptions::default);
        self
    }

    /// Set filtering options shared by all filter fields.
    pub fn filter_options(mut self, options: FilteringOptions) -> Self {
        self.filtering = Some(options);
        self
    }

    /// Enable search over `fields`.
    pub fn search<I, S>(mut self, fields: I, options: SearchOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = Some((fields.into_iter().map(Into::into).collect(), options));
        self
    }

    /// Add an endpoint-specific field.
    pub fn extra(mut self, field: ExtraField) -> Self {
        self.extra_fields.push(field);
        self
    }

    pub fn options(mut self, options: ContractOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate every module and compose the contract.
    pub fn build(self) -> Result<QueryContract, ConfigError> {
        let pagination = self.pagination.map(build_pagination_config).transpose()?;
        let sorting = self
            .sorting
            .map(|(fields, options)| build_sorting_config(fields, options))
            .transpose()?;
        let filtering = self
            .filtering
            .map(|options| build_filtering_config(self.filter_fields, options))
            .transpose()?;
        let search = self
            .search
            .map(|(fields, options)| build_search_config(fields, options))
            .transpose()?;

        compose(ContractModules {
            pagination,
            sorting,
            filtering,
            search,
            extra_fields: self.extra_fields,
            options: self.options,
        })
    }
}

fn sorted_by_first<I, S>(sortable: I) -> (Vec<String>, SortingOptions)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = sortable.into_iter().map(Into::into).collect();
    let mut options = SortingOptions::default();
    options.default_field = fields.first().cloned();
    (fields, options)
}

/// Offset-paginated list sorted by one of `sortable` (the first by default).
pub fn basic_list<I, S>(sortable: I) -> Result<QueryContract, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let (fields, options) = sorted_by_first(sortable);
    QueryBuilder::new()
        .paginate(PaginationOptions::default())
        .sort(fields, options)
        .build()
}

/// [`basic_list`] plus free-text search over `searchable`, narrowable by
/// `searchFields`.
pub fn searchable_list<I, S, J, T>(sortable: I, searchable: J) -> Result<QueryContract, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    J: IntoIterator<Item = T>,
    T: Into<String>,
{
    let (fields, options) = sorted_by_first(sortable);
    let searchable: Vec<String> = searchable.into_iter().map(Into::into).collect();
    let mut search = SearchOptions::default();
    search.allow_field_selection = !searchable.is_empty();

    QueryBuilder::new()
        .paginate(PaginationOptions::default())
        .sort(fields, options)
        .search(searchable, search)
        .build()
}

/// Every module enabled: offset, page, and cursor pagination; multi-field
/// sorting with nulls handling; filters with logical groups; search.
pub fn advanced_list<I, S, F, K, J, T>(
    sortable: I,
    filters: F,
    searchable: J,
) -> Result<QueryContract, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: IntoIterator<Item = (K, FieldOptions)>,
    K: Into<String>,
    J: IntoIterator<Item = T>,
    T: Into<String>,
{
    let (fields, options) = sorted_by_first(sortable);
    let searchable: Vec<String> = searchable.into_iter().map(Into::into).collect();
    let mut search = SearchOptions::default();
    search.allow_field_selection = !searchable.is_empty();

    let mut builder = QueryBuilder::new()
        .paginate(PaginationOptions::default().modes([
            PaginationMode::Offset,
            PaginationMode::Page,
            PaginationMode::Cursor,
        ]))
        .sort(fields, options.allow_multiple().allow_nulls_handling())
        .filter_options(FilteringOptions::default())
        .search(searchable, search);
    for (name, field) in filters {
        builder = builder.filter(name, field);
    }
    builder.build()
}
