//! Pagination utilities for catalog listings

use crate::config::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Requested page window (1-indexed page, rows per page)
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Sanitize user input: page at least 1, limit within `1..=MAX_PAGE_SIZE`,
    /// `default_limit` when unspecified.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Offset for SQL LIMIT/OFFSET
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata returned next to a page of items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    /// Total number of pages
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let req = PageRequest::new(None, None, 50);
        assert_eq!((req.page, req.limit, req.offset()), (1, 50, 0));

        let req = PageRequest::new(Some(0), Some(10_000), 50);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);

        let req = PageRequest::new(Some(3), Some(20), 50);
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn test_pages_round_up() {
        let req = PageRequest::new(Some(1), Some(100), 50);
        assert_eq!(Pagination::new(req, 250).pages, 3);
        assert_eq!(Pagination::new(req, 200).pages, 2);
        assert_eq!(Pagination::new(req, 0).pages, 0);
    }
}
