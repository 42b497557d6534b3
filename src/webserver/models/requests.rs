/// Query parameter types for API endpoints
use serde::Deserialize;

use crate::logger::{self, LogTag};
use crate::tokens::{
    FilterParams, PaginationParams, SortDirection, TimePeriod, TokenSortKey,
};

/// `GET /api/tokens` query string
///
/// Everything arrives as text so one malformed value never rejects the whole
/// request: unknown enum values fall back to their defaults and unparsable
/// numbers are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListQuery {
    pub time_period: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub min_volume: Option<String>,
    pub min_market_cap: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl TokenListQuery {
    pub fn filters(&self) -> FilterParams {
        FilterParams {
            time_period: parse_or_default(self.time_period.as_deref(), "timePeriod", TimePeriod::from_str),
            sort_by: parse_or_default(self.sort_by.as_deref(), "sortBy", TokenSortKey::from_str),
            sort_order: parse_or_default(self.sort_order.as_deref(), "sortOrder", SortDirection::from_str),
            min_volume: parse_number(self.min_volume.as_deref()),
            min_market_cap: parse_number(self.min_market_cap.as_deref()),
        }
    }

    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self
                .limit
                .as_deref()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0),
            cursor: self.cursor.clone().filter(|c| !c.trim().is_empty()),
        }
    }
}

fn parse_or_default<T: Default>(value: Option<&str>, field: &str, parse: fn(&str) -> Option<T>) -> T {
    match value {
        None => T::default(),
        Some(raw) => parse(raw).unwrap_or_else(|| {
            logger::debug(
                LogTag::Webserver,
                &format!("Unknown {} '{}', using default", field, raw),
            );
            T::default()
        }),
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
