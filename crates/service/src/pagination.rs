//! Pagination and date-range parsing for the pickup-point listing.
//!
//! Inputs arrive as raw query strings. Anything unparsable or out of range
//! falls back to a default instead of failing the request.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 30;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page, `1..=MAX_LIMIT`
    pub limit: u64,
}

impl Pagination {
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .map(|p| p as u64)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0 && *l as u64 <= MAX_LIMIT)
            .map(|l| l as u64)
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    /// Rows to skip; page 0 is treated as page 1.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

/// Raw `GET /pvz` query, exactly as the caller sent it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvzListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized listing filter handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub pagination: Pagination,
}

impl PvzListQuery {
    pub fn normalize(&self) -> ListFilter {
        ListFilter {
            start: parse_date(self.start_date.as_deref()),
            end: parse_date(self.end_date.as_deref()),
            pagination: Pagination::from_raw(self.page.as_deref(), self.limit.as_deref()),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
}
