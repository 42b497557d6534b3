/// Seams between the aggregation engine and the provider clients
///
/// The engine only sees these traits, so tests drive it with in-memory stubs.
use crate::apis::client::RateLimiterStatus;
use crate::apis::stats::ApiStats;
use crate::errors::ApiError;
use crate::tokens::types::TokenRecord;
use async_trait::async_trait;
use std::collections::HashMap;

/// A provider that yields complete token records (search, trending)
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    /// One fetch cycle, already shaped into canonical records
    async fn fetch_tokens(&self) -> Result<Vec<TokenRecord>, ApiError>;

    fn rate_limiter_status(&self) -> RateLimiterStatus;

    fn stats(&self) -> ApiStats;
}

/// A price-only provider used for enrichment
#[async_trait]
pub trait PriceOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Prices keyed by address as returned by the provider
    ///
    /// `Ok(None)` means the feature is unavailable right now (auth required,
    /// empty response); callers keep their existing prices.
    async fn fetch_prices(
        &self,
        addresses: &[String],
    ) -> Result<Option<HashMap<String, f64>>, ApiError>;

    fn rate_limiter_status(&self) -> RateLimiterStatus;

    fn stats(&self) -> ApiStats;
}
