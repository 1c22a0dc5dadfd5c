use super::error::QueryError;
use super::filter::translate_filter;
use super::pagination::{translate_pagination, PaginationSpec};
use super::projection::{translate_projection, ProjectionSpec};
use super::raw::{RawQueryParameters, RawValue};
use super::sort::{translate_sort, SortSpec};
use super::types::FilterExpression;
use serde::Serialize;

/// Control keys consumed before filter translation
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Everything a list request asks of the query layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFeatures {
    pub filter: FilterExpression,
    pub sort: SortSpec,
    pub projection: ProjectionSpec,
    pub pagination: PaginationSpec,
}

impl QueryFeatures {
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        Self::from_raw(RawQueryParameters::parse(query))
    }

    pub fn from_raw(mut raw: RawQueryParameters) -> Result<Self, QueryError> {
        let [page, sort, limit, fields] = RESERVED_KEYS.map(|key| raw.remove(key));

        let features = Self {
            filter: translate_filter(&raw),
            sort: translate_sort(text_of(&sort)),
            projection: translate_projection(text_of(&fields))?,
            pagination: translate_pagination(text_of(&page), text_of(&limit)),
        };

        tracing::debug!(
            sort = %features.sort,
            page = features.pagination.page,
            limit = features.pagination.limit,
            skip = features.pagination.skip,
            "translated list query"
        );
        Ok(features)
    }
}

fn text_of(value: &Option<RawValue>) -> Option<&str> {
    value.as_ref().and_then(RawValue::as_text)
}
