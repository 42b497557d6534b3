/// Canonical token record and the read-path parameter types
use serde::{Deserialize, Serialize};

/// Source label of the search provider
pub const SOURCE_DEXSCREENER: &str = "DexScreener";
/// Source label (and protocol label) of the trending provider
pub const SOURCE_GECKOTERMINAL: &str = "GeckoTerminal";
/// Source label added by price enrichment
pub const SOURCE_JUPITER: &str = "Jupiter";

// ============================================================================
// TOKEN RECORD
// ============================================================================

/// Merged market view of one token
///
/// Market fields are denominated in SOL. `last_updated` is unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_address: String,
    pub token_name: String,
    pub token_ticker: String,
    pub price_sol: f64,
    pub market_cap_sol: f64,
    pub volume_sol: f64,
    pub liquidity_sol: f64,
    pub transaction_count: u64,
    pub price_1hr_change: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_24hr_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_7d_change: Option<f64>,
    pub protocol: String,
    pub sources: Vec<String>,
    pub last_updated: i64,
}

impl TokenRecord {
    /// Lower-cased address used as the identity key
    pub fn normalized_address(&self) -> String {
        self.token_address.to_lowercase()
    }

    /// Append a source label unless it is already present
    pub fn add_source(&mut self, source: &str) {
        if !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
        }
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }
}

/// 7-day momentum: 7d, else 24h, else 0
pub fn seven_day_change(record: &TokenRecord) -> f64 {
    record
        .price_7d_change
        .or(record.price_24hr_change)
        .unwrap_or(0.0)
}

/// Momentum value used when sorting by price change for `period`
pub fn momentum_for_period(record: &TokenRecord, period: TimePeriod) -> f64 {
    match period {
        TimePeriod::OneHour => record.price_1hr_change,
        TimePeriod::TwentyFourHours => record.price_24hr_change.unwrap_or(0.0),
        TimePeriod::SevenDays => seven_day_change(record),
    }
}

// ============================================================================
// FILTER / SORT PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePeriod {
    OneHour,
    #[default]
    TwentyFourHours,
    SevenDays,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::OneHour => "1h",
            TimePeriod::TwentyFourHours => "24h",
            TimePeriod::SevenDays => "7d",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "1h" => Some(TimePeriod::OneHour),
            "24h" => Some(TimePeriod::TwentyFourHours),
            "7d" => Some(TimePeriod::SevenDays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSortKey {
    #[default]
    Volume,
    MarketCap,
    Liquidity,
    PriceChange,
}

impl TokenSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSortKey::Volume => "volume",
            TokenSortKey::MarketCap => "market_cap",
            TokenSortKey::Liquidity => "liquidity",
            TokenSortKey::PriceChange => "price_change",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "volume" => Some(TokenSortKey::Volume),
            "market_cap" => Some(TokenSortKey::MarketCap),
            "liquidity" => Some(TokenSortKey::Liquidity),
            "price_change" => Some(TokenSortKey::PriceChange),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Conjunctive filters plus sort selection
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub time_period: TimePeriod,
    pub sort_by: TokenSortKey,
    pub sort_order: SortDirection,
    pub min_volume: Option<f64>,
    pub min_market_cap: Option<f64>,
}

// ============================================================================
// PAGINATION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PaginationParams {
    /// 0 means "use the default limit"
    pub limit: usize,
    pub cursor: Option<String>,
}

/// One page of a filtered/sorted result set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPage {
    pub tokens: Vec<TokenRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub total: usize,
    pub timestamp: i64,
}

// ============================================================================
// METRICS
// ============================================================================

/// Summary over the current aggregated set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    pub total_tokens: usize,
    pub average_volume: f64,
    pub average_market_cap: f64,
    pub top_gainers: Vec<TokenRecord>,
    pub top_volume: Vec<TokenRecord>,
}
