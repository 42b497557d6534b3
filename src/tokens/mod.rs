//! Token aggregation domain
//!
//! - `types`: canonical [`TokenRecord`] and read-path parameters
//! - `sources`: provider seams used by the engine
//! - `merge`: per-address deduplication
//! - `filtering` / `pagination`: read-path shaping
//! - `aggregator`: the cached fetch/merge/enrich cycle

pub mod aggregator;
pub mod filtering;
pub mod merge;
pub mod pagination;
pub mod sources;
pub mod types;

pub use aggregator::{compute_metrics, AggregationEngine, TOKENS_CACHE_KEY, TOKENS_CACHE_PATTERN};
pub use filtering::filter_and_sort;
pub use merge::merge_records;
pub use pagination::{decode_cursor, encode_cursor, paginate, PaginationCursor};
pub use sources::{MarketDataSource, PriceOracle};
pub use types::{
    FilterParams, PaginationParams, SortDirection, TimePeriod, TokenMetrics, TokenPage,
    TokenRecord, TokenSortKey, SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL, SOURCE_JUPITER,
};
