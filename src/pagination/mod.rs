//! Route-level pagination and ordering parser.
//!
//! Query-string values are untrusted: anything unparsable falls back to a
//! default and out-of-range values are clamped, never rejected.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

/// A single `column:direction` rule from `orderBy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRule {
    pub column: String,
    pub ascending: bool,
}

impl OrderRule {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }
}

pub fn parse_pagination(params: &HashMap<String, String>) -> Pagination {
    let page = parse_int(params.get("page")).unwrap_or(DEFAULT_PAGE as i64).max(1);
    let page_size = parse_int(params.get("pageSize"))
        .unwrap_or(DEFAULT_PAGE_SIZE as i64)
        .clamp(1, MAX_PAGE_SIZE as i64);

    Pagination { page: page.min(u32::MAX as i64) as u32, page_size: page_size as u32 }
}

/// Integer prefix of a query value; `"3.7"` reads as 3.
fn parse_int(raw: Option<&String>) -> Option<i64> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
}

/// `"name:asc,createdAt:desc"` → ordered rules. Missing or unknown directions
/// sort ascending; only `desc`/`dsc` (any case) sort descending.
pub fn parse_order_by(raw: Option<&str>) -> Vec<OrderRule> {
    let Some(raw) = raw else { return vec![] };

    raw.split(',')
        .filter_map(|part| {
            let mut it = part.trim().splitn(2, ':');
            let column = it.next()?.trim();
            if column.is_empty() {
                return None;
            }
            let ascending = !matches!(
                it.next().map(|d| d.trim().to_ascii_lowercase()).as_deref(),
                Some("desc") | Some("dsc")
            );
            Some(OrderRule { column: column.to_string(), ascending })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// List envelope: `{ data, pagination, metadata? }`.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse {
    pub data: Vec<Value>,
    pub pagination: PaginationMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

pub fn build_paginated_response(
    data: Vec<Value>,
    page: u32,
    page_size: u32,
    total: u64,
    metadata: Option<Value>,
) -> PaginatedResponse {
    let size = page_size.max(1) as u64;
    PaginatedResponse {
        data,
        pagination: PaginationMeta {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(size),
        },
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_absent_or_garbage() {
        assert_eq!(parse_pagination(&params(&[])), Pagination { page: 1, page_size: 10 });
        assert_eq!(
            parse_pagination(&params(&[("page", "abc"), ("pageSize", "")])),
            Pagination { page: 1, page_size: 10 }
        );
    }

    #[test]
    fn page_is_floored_at_one() {
        for p in [-5, 0, 1, 7] {
            let parsed = parse_pagination(&params(&[("page", &p.to_string())]));
            assert_eq!(parsed.page as i64, (p as i64).max(1));
        }
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(parse_pagination(&params(&[("pageSize", "500")])).page_size, 100);
        assert_eq!(parse_pagination(&params(&[("pageSize", "0")])).page_size, 1);
        assert_eq!(parse_pagination(&params(&[("pageSize", "-3")])).page_size, 1);
        assert_eq!(parse_pagination(&params(&[("pageSize", "25")])).page_size, 25);
        assert_eq!(parse_pagination(&params(&[("page", "3.7")])).page, 3);
    }

    #[test]
    fn offsets() {
        let p = Pagination { page: 3, page_size: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn parses_order_by() {
        assert_eq!(
            parse_order_by(Some("name:asc,createdAt:desc")),
            vec![OrderRule::asc("name"), OrderRule::desc("createdAt")]
        );
        assert_eq!(parse_order_by(None), vec![]);
        assert_eq!(parse_order_by(Some("")), vec![]);
        assert_eq!(parse_order_by(Some("name")), vec![OrderRule::asc("name")]);
        assert_eq!(
            parse_order_by(Some("a:DSC, b:sideways,,c:Desc")),
            vec![OrderRule::desc("a"), OrderRule::asc("b"), OrderRule::desc("c")]
        );
    }

    #[test]
    fn envelope_shape() {
        let resp = build_paginated_response(vec![json!({"id": 1})], 2, 10, 21, None);
        assert_eq!(resp.pagination.total_pages, 3);
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            body,
            json!({
                "data": [{"id": 1}],
                "pagination": { "page": 2, "pageSize": 10, "total": 21, "totalPages": 3 }
            })
        );

        let with_meta = build_paginated_response(vec![], 1, 10, 0, Some(json!({"k": "v"})));
        assert_eq!(with_meta.pagination.total_pages, 0);
        assert_eq!(serde_json::to_value(&with_meta).unwrap()["metadata"]["k"], "v");
    }

    #[test]
    fn total_pages_is_ceiling() {
        for (total, size, expected) in [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (100, 100, 1)] {
            let resp = build_paginated_response(vec![], 1, size, total, None);
            assert_eq!(resp.pagination.total_pages, expected);
        }
    }
}
