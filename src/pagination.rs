//! Pagination envelope shared by every list endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;
pub const DOCUMENT_DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// `page`/`limit` query parameters, both optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Clamp to sane bounds and resolve defaults.
    pub fn resolve(self, default_limit: u32) -> ResolvedPage {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        ResolvedPage { page, limit }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedPage {
    pub page: u32,
    pub limit: u32,
}

impl ResolvedPage {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: ResolvedPage) -> Self {
        let limit = i64::from(page.limit);
        Self {
            total,
            page: page.page,
            limit: page.limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// `{ data, meta }` response body for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: ResolvedPage) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let resolved = PageParams::default().resolve(DEFAULT_LIMIT);
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.limit, 10);
        assert_eq!(resolved.offset(), 0);
    }

    #[test]
    fn out_of_range_params_are_clamped() {
        let resolved = PageParams {
            page: Some(0),
            limit: Some(10_000),
        }
        .resolve(DEFAULT_LIMIT);
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.limit, 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageParams {
            page: Some(2),
            limit: Some(10),
        }
        .resolve(DEFAULT_LIMIT);
        assert_eq!(page.offset(), 10);
        assert_eq!(PageMeta::new(21, page).total_pages, 3);
        assert_eq!(PageMeta::new(20, page).total_pages, 2);
        assert_eq!(PageMeta::new(0, page).total_pages, 0);
    }
}
