use std::cmp::Ordering;
use std::str::FromStr;

use crate::movie::Movie;
use crate::validator::{permitted_value, Validator};

pub const MAX_PAGE: i64 = 10_000_000;

pub const MAX_PAGE_SIZE: i64 = 100;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Every accepted value of the `sort` query parameter.
pub const SORT_SAFELIST: [&str; 8] = [
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Columns a movie listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Id,
    Title,
    Year,
    Runtime,
}

impl SortColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::Year => "year",
            SortColumn::Runtime => "runtime",
        }
    }
}

/// Sort key parsed from `column` or `-column` (descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort value: {0}")]
pub struct InvalidSort(pub String);

impl FromStr for Sort {
    type Err = InvalidSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let column = match name {
            "id" => SortColumn::Id,
            "title" => SortColumn::Title,
            "year" => SortColumn::Year,
            "runtime" => SortColumn::Runtime,
            _ => return Err(InvalidSort(s.to_string())),
        };

        Ok(Sort { column, descending })
    }
}

impl Sort {
    pub fn direction(self) -> &'static str {
        if self.descending {
            "DESC"
        } else {
            "ASC"
        }
    }

    /// Order two movies by this key, ties broken by ascending id.
    pub fn compare(self, a: &Movie, b: &Movie) -> Ordering {
        let primary = match self.column {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Title => a.title.cmp(&b.title),
            SortColumn::Year => a.year.cmp(&b.year),
            SortColumn::Runtime => a.runtime.cmp(&b.runtime),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Pagination and ordering for a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: Sort,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl Filters {
    /// Build filters from raw query values, recording findings in `v`.
    pub fn parse(page: i64, page_size: i64, sort: &str, v: &mut Validator) -> Self {
        v.check(
            permitted_value(&sort, &SORT_SAFELIST),
            "sort",
            "invalid sort value",
        );
        let sort = sort.parse::<Sort>().unwrap_or_default();
        let filters = Self {
            page,
            page_size,
            sort,
        };
        validate_filters(v, &filters);
        filters
    }

    /// Rows per page, held to `0..=MAX_PAGE_SIZE` for unvalidated input.
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(0, MAX_PAGE_SIZE)
    }

    /// Rows skipped before this page. Pages below 1 read as the first page.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }
}

pub fn validate_filters(v: &mut Validator, filters: &Filters) {
    v.check(filters.page > 0, "page", "must be greater than zero");
    v.check(
        filters.page <= MAX_PAGE,
        "page",
        "must be a maximum of 10 million",
    );
    v.check(filters.page_size > 0, "page_size", "must be greater than zero");
    v.check(
        filters.page_size <= MAX_PAGE_SIZE,
        "page_size",
        "must be a maximum of 100",
    );
}
