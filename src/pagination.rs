//! Pagination utilities for API responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MIN_LIMIT: i64 = 1;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[param(minimum = 1, default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,

    /// Number of items per page. Defaults to 20, max 100.
    #[param(minimum = 1, maximum = 100, default = 20)]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PaginationParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(MIN_LIMIT, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn limit_offset(&self) -> (i64, i64) {
        (self.limit(), self.offset())
    }

    pub fn into_metadata(self, total: i64) -> PaginationMeta {
        PaginationMeta::new(self.page(), self.limit(), total)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_pagination_params_clamping() {
        let params = PaginationParams::new(0, 20);
        assert_eq!(params.page(), 1);

        let params = PaginationParams::new(-5, 20);
        assert_eq!(params.page(), 1);

        let params = PaginationParams::new(1, 500);
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = PaginationParams::new(1, 0);
        assert_eq!(params.limit(), MIN_LIMIT);
    }

    #[test]
    fn test_limit_offset() {
        let params = PaginationParams::new(1, 20);
        assert_eq!(params.limit_offset(), (20, 0));

        let params = PaginationParams::new(2, 20);
        assert_eq!(params.limit_offset(), (20, 20));

        let params = PaginationParams::new(3, 10);
        assert_eq!(params.limit_offset(), (10, 20));
    }

    #[test]
    fn test_pagination_meta_total_pages() {
        assert_eq!(PaginationMeta::new(1, 20, 100).total_pages, 5);
        assert_eq!(PaginationMeta::new(1, 20, 95).total_pages, 5);
        assert_eq!(PaginationMeta::new(1, 20, 101).total_pages, 6);
        assert_eq!(PaginationMeta::new(1, 20, 1).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
    }

    #[test]
    fn test_pagination_meta_wire_format() {
        let meta = PaginationMeta::new(2, 10, 25);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["total"], 25);
        assert_eq!(json["totalPages"], 3);
    }
}
