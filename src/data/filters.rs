//! Pagination and sorting for list endpoints.

use serde::Serialize;

use crate::validator::{permitted_value, Validator};

const MAX_PAGE: u64 = 10_000_000;
const MAX_PAGE_SIZE: u64 = 100;

/// Paging and sort options parsed from a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: u64,
    pub page_size: u64,
    /// Column name, optionally prefixed with `-` for descending order.
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    /// Sort column without the direction prefix. Callers validate `sort`
    /// against the safelist first; anything else falls back to `id`.
    pub fn sort_column(&self) -> &str {
        if self.sort_safelist.contains(&self.sort.as_str()) {
            self.sort.trim_start_matches('-')
        } else {
            "id"
        }
    }

    pub fn descending(&self) -> bool {
        self.sort.starts_with('-')
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) * self.page_size) as usize
    }
}

pub fn validate_filters(v: &mut Validator, f: &Filters) {
    v.check(f.page > 0, "page", "must be greater than zero");
    v.check(f.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(f.page_size > 0, "page_size", "must be greater than zero");
    v.check(f.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");
    v.check(
        permitted_value(&f.sort.as_str(), f.sort_safelist),
        "sort",
        "invalid sort value",
    );
}

/// Pagination summary returned alongside list results. Serializes as `{}`
/// when there are no records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

pub fn calculate_metadata(total_records: u64, page: u64, page_size: u64) -> Metadata {
    if total_records == 0 || page_size == 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: total_records.div_ceil(page_size),
        total_records,
    }
}
