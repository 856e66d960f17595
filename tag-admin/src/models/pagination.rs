use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{pick_object, pick_u64, Object};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

/// Pagination block of a list response; anything unreadable yields the
/// defaults.
pub fn normalize_pagination(value: &Value) -> Pagination {
    Pagination::from_value(value)
}

impl Pagination {
    /// Reads `pagination` (or `meta`) from a list response, falling back to
    /// top-level `page`/`total` fields and finally to the defaults.
    pub fn from_response(obj: &Object, item_count: usize) -> Self {
        let source = pick_object(obj, &["pagination", "meta"]).unwrap_or(obj);
        let defaults = Self::default();

        let page = pick_u64(source, &["page", "currentPage"])
            .filter(|p| *p > 0)
            .unwrap_or(defaults.page);
        let limit = pick_u64(source, &["limit", "pageSize", "perPage"])
            .filter(|l| *l > 0)
            .unwrap_or(defaults.limit);
        let total = pick_u64(source, &["total", "totalItems", "count"]).unwrap_or(item_count as u64);
        let total_pages = pick_u64(source, &["totalPages", "pages"])
            .unwrap_or_else(|| total.div_ceil(limit));

        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        value
            .as_object()
            .map(|obj| Self::from_response(obj, 0))
            .unwrap_or_default()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn previous_page(&self) -> u64 {
        self.page.saturating_sub(1).max(1)
    }

    pub fn next_page(&self) -> u64 {
        self.page + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_pagination() {
        let body = json!({ "pagination": { "page": 2, "limit": 20, "total": 45, "totalPages": 3 } });
        let p = Pagination::from_response(body.as_object().unwrap(), 20);
        assert_eq!(p, Pagination { page: 2, limit: 20, total: 45, total_pages: 3 });
        assert!(p.has_previous());
        assert!(p.has_next());
    }

    #[test]
    fn derives_total_pages_when_missing() {
        let body = json!({ "page": 1, "limit": 10, "total": 21 });
        let p = Pagination::from_response(body.as_object().unwrap(), 10);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn defaults_when_absent() {
        let body = json!({});
        let p = Pagination::from_response(body.as_object().unwrap(), 0);
        assert_eq!(p, Pagination::default());
        assert!(!p.has_next());
    }
}
