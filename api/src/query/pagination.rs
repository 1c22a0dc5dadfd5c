use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Upper bound for page and limit, keeps `skip` inside an SQLite integer
const MAX_COMPONENT: f64 = u32::MAX as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationSpec {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl PaginationSpec {
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

/// Translates `page` and `limit` into a page window.
///
/// Values that are absent, non-numeric, fractional or below one fall back to
/// page 1 and limit 10. A skip past the last record is left to the query
/// layer, which returns an empty page.
pub fn translate_pagination(page: Option<&str>, limit: Option<&str>) -> PaginationSpec {
    PaginationSpec::new(
        parse_positive(page).unwrap_or(DEFAULT_PAGE),
        parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
    )
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let number: f64 = raw?.trim().parse().ok()?;
    if number.is_finite() && number >= 1.0 && number.fract() == 0.0 && number <= MAX_COMPONENT {
        Some(number as u64)
    } else {
        None
    }
}
