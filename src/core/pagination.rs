//! Paging for list endpoints.
//!
//! Clients send 1-based `page` and `limit` query parameters; the response carries
//! `{ total, page, limit, totalPages }` alongside the data.

use crate::config::settings::PaginationConfig;
use serde::{Deserialize, Serialize};

/// Largest row offset the database accepts
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Raw paging parameters as sent by the client.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Paging parameters after defaults and bounds have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Page size, never zero
    pub limit: u64,
}

impl PageRequest {
    /// Applies defaults and clamps to the configured bounds.
    ///
    /// Page 0 is treated as page 1; a zero or missing limit becomes the default limit.
    /// The page is capped so the row offset `(page - 1) * limit` fits in an `i64`.
    #[must_use]
    pub fn from_params(params: PageParams, config: &PaginationConfig) -> Self {
        let limit = match params.limit {
            Some(0) | None => config.default_limit,
            Some(limit) => limit.min(config.max_limit),
        }
        .max(1);
        let last_page = MAX_OFFSET / limit + 1;
        let page = params.page.unwrap_or(1).clamp(1, last_page);
        Self { page, limit }
    }

    /// Zero-based page index as expected by `SeaORM`'s paginator.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page - 1
    }
}

/// Paging metadata returned next to list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(request.limit),
        }
    }
}

/// A page of items together with its paging metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: PaginationConfig = PaginationConfig {
        default_limit: 10,
        max_limit: 100,
    };

    #[test]
    fn test_defaults_apply_when_params_missing() {
        let request = PageRequest::from_params(PageParams::default(), &CONFIG);
        assert_eq!(request, PageRequest { page: 1, limit: 10 });
        assert_eq!(request.index(), 0);
    }

    #[test]
    fn test_page_zero_and_limit_zero_are_normalised() {
        let params = PageParams {
            page: Some(0),
            limit: Some(0),
        };
        let request = PageRequest::from_params(params, &CONFIG);
        assert_eq!(request, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        let params = PageParams {
            page: Some(3),
            limit: Some(5_000),
        };
        let request = PageRequest::from_params(params, &CONFIG);
        assert_eq!(request, PageRequest { page: 3, limit: 100 });
        assert_eq!(request.index(), 2);
    }

    #[test]
    fn test_huge_page_keeps_offset_in_range() {
        let params = PageParams {
            page: Some(9_223_372_036_854_775_807),
            limit: Some(10),
        };
        let request = PageRequest::from_params(params, &CONFIG);
        assert_eq!(request.limit, 10);
        let offset = request.index().checked_mul(request.limit);
        assert!(offset.is_some_and(|o| o <= MAX_OFFSET));

        let params = PageParams {
            page: Some(u64::MAX),
            limit: Some(1),
        };
        let request = PageRequest::from_params(params, &CONFIG);
        assert_eq!(request.index(), MAX_OFFSET);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let request = PageRequest { page: 1, limit: 10 };
        assert_eq!(Pagination::new(request, 0).total_pages, 0);
        assert_eq!(Pagination::new(request, 10).total_pages, 1);
        assert_eq!(Pagination::new(request, 11).total_pages, 2);
        assert_eq!(Pagination::new(request, 95).total_pages, 10);
    }
}
