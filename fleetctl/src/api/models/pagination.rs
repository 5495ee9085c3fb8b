//! Shared pagination types for API query parameters.
//!
//! All list endpoints use page-based pagination with `page` (1-based) and `limit`.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items per page (default: 10, max: 100)
///
/// Query structs flatten this in, so numbers arrive as strings and are parsed with
/// `DisplayFromStr`.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Page number, starting at 1 (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the page, defaulting to 1 and never below 1.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of rows to skip for the requested page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// `(skip, limit)` for repository filters.
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// Generic paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub data: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
    /// Current page (1-based)
    pub page: i64,
    /// Maximum items returned per page
    pub limit: i64,
    /// Number of pages available for `limit`
    pub total_pages: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, pagination: &Pagination) -> Self {
        let limit = pagination.limit();
        Self {
            data,
            total_count,
            page: pagination.page(),
            limit,
            total_pages: (total_count + limit - 1) / limit,
        }
    }
}
