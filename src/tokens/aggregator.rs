/// Aggregation engine - cache, parallel fetch, merge, enrichment
///
/// One cycle runs CHECK_CACHE -> FETCH_PARALLEL -> MERGE -> ENRICH ->
/// CACHE_WRITE. Provider failures only remove that provider's contribution;
/// a panic anywhere in the cycle degrades to an empty result.
use crate::cache::CacheStore;
use crate::config::AggregationConfig;
use crate::errors::{AggregationError, ApiError};
use crate::logger::{self, LogLevel, LogTag};
use crate::tokens::filtering;
use crate::tokens::merge::merge_records;
use crate::tokens::pagination;
use crate::tokens::sources::{MarketDataSource, PriceOracle};
use crate::tokens::types::{
    FilterParams, PaginationParams, TokenMetrics, TokenPage, TokenRecord, SOURCE_JUPITER,
};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Cache key of the merged token set
pub const TOKENS_CACHE_KEY: &str = "tokens:all";
/// Pattern covering every token-derived cache entry
pub const TOKENS_CACHE_PATTERN: &str = "tokens:*";

const METRICS_TOP_N: usize = 5;

pub struct AggregationEngine {
    cache: Arc<CacheStore>,
    search: Arc<dyn MarketDataSource>,
    trending: Arc<dyn MarketDataSource>,
    oracle: Arc<dyn PriceOracle>,
    config: AggregationConfig,
}

impl AggregationEngine {
    pub fn new(
        cache: Arc<CacheStore>,
        search: Arc<dyn MarketDataSource>,
        trending: Arc<dyn MarketDataSource>,
        oracle: Arc<dyn PriceOracle>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            cache,
            search,
            trending,
            oracle,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Current merged token set; never fails
    pub async fn aggregate(&self) -> Vec<TokenRecord> {
        match self.aggregate_guarded().await {
            Ok(tokens) => tokens,
            Err(e) => {
                logger::error(LogTag::Aggregator, &format!("Aggregation failed: {}", e));
                Vec::new()
            }
        }
    }

    async fn aggregate_guarded(&self) -> Result<Vec<TokenRecord>, AggregationError> {
        AssertUnwindSafe(self.run_cycle())
            .catch_unwind()
            .await
            .map_err(|panic| AggregationError::Panicked(panic_message(panic.as_ref())))
    }

    async fn run_cycle(&self) -> Vec<TokenRecord> {
        if let Some(cached) = self.cache.get::<Vec<TokenRecord>>(TOKENS_CACHE_KEY).await {
            if !cached.is_empty() {
                logger::debug(
                    LogTag::Aggregator,
                    &format!("Returning {} cached tokens", cached.len()),
                );
                return cached;
            }
        }

        let started = Instant::now();

        let (search_result, trending_result) =
            tokio::join!(self.search.fetch_tokens(), self.trending.fetch_tokens());

        // Declaration order, not completion order, decides merge precedence
        let mut observations = Vec::new();
        for (source, result) in [
            (self.search.name(), search_result),
            (self.trending.name(), trending_result),
        ] {
            match result {
                Ok(tokens) => {
                    logger::debug(
                        LogTag::Aggregator,
                        &format!("{} returned {} tokens", source, tokens.len()),
                    );
                    observations.extend(tokens);
                }
                Err(e) => logger::warning(
                    LogTag::Aggregator,
                    &format!("{} fetch failed, continuing without it: {}", source, e),
                ),
            }
        }

        let mut merged = merge_records(observations, chrono::Utc::now().timestamp_millis());
        self.enrich(&mut merged).await;

        self.cache.set(TOKENS_CACHE_KEY, &merged, None).await;

        logger::info(
            LogTag::Aggregator,
            &format!(
                "Aggregated {} tokens in {}ms",
                merged.len(),
                started.elapsed().as_millis()
            ),
        );

        merged
    }

    /// Overwrite prices of the leading records with oracle prices
    async fn enrich(&self, records: &mut [TokenRecord]) {
        let limit = self.config.enrichment_limit.min(records.len());
        if limit == 0 {
            return;
        }

        let addresses: Vec<String> = records[..limit]
            .iter()
            .map(|t| t.token_address.clone())
            .collect();

        let prices = match self.oracle.fetch_prices(&addresses).await {
            Ok(Some(prices)) => prices,
            Ok(None) => {
                logger::debug(
                    LogTag::Aggregator,
                    &format!("{} prices unavailable, keeping provider prices", self.oracle.name()),
                );
                return;
            }
            Err(e) => {
                let message = format!("{} enrichment failed: {}", self.oracle.name(), e);
                match enrichment_failure_level(&e) {
                    LogLevel::Debug => logger::debug(LogTag::Aggregator, &message),
                    _ => logger::warning(LogTag::Aggregator, &message),
                }
                return;
            }
        };

        let by_address: HashMap<String, f64> = prices
            .into_iter()
            .map(|(address, price)| (address.to_lowercase(), price))
            .collect();

        let mut enriched = 0usize;
        for record in records[..limit].iter_mut() {
            if let Some(price) = by_address.get(&record.normalized_address()) {
                record.price_sol = *price;
                record.add_source(SOURCE_JUPITER);
                enriched += 1;
            }
        }

        logger::debug(
            LogTag::Aggregator,
            &format!("Enriched {} of {} tokens with oracle prices", enriched, limit),
        );
    }

    /// Drop every cached token-derived entry
    pub async fn invalidate_cache(&self) {
        self.cache.delete_pattern(TOKENS_CACHE_PATTERN).await;
        logger::info(LogTag::Aggregator, "Token cache invalidated");
    }

    /// Case-insensitive lookup in the aggregated set
    pub async fn find_token(&self, address: &str) -> Option<TokenRecord> {
        let wanted = address.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.aggregate()
            .await
            .into_iter()
            .find(|t| t.normalized_address() == wanted)
    }

    pub async fn metrics(&self) -> TokenMetrics {
        compute_metrics(&self.aggregate().await)
    }

    pub fn filter_and_sort(&self, records: &[TokenRecord], filters: &FilterParams) -> Vec<TokenRecord> {
        filtering::filter_and_sort(records, filters)
    }

    pub fn paginate(&self, records: Vec<TokenRecord>, params: &PaginationParams) -> TokenPage {
        pagination::paginate(
            records,
            params,
            self.config.default_page_limit,
            self.config.max_page_limit,
        )
    }
}

/// Oracle outages (auth, DNS, disabled) are an expected degradation
fn enrichment_failure_level(err: &ApiError) -> LogLevel {
    if err.is_unavailable() {
        LogLevel::Debug
    } else {
        LogLevel::Warning
    }
}

/// Summary statistics; averages are 0 on an empty set
pub fn compute_metrics(records: &[TokenRecord]) -> TokenMetrics {
    let total = records.len();
    let (average_volume, average_market_cap) = if total == 0 {
        (0.0, 0.0)
    } else {
        let volume: f64 = records.iter().map(|t| t.volume_sol).sum();
        let market_cap: f64 = records.iter().map(|t| t.market_cap_sol).sum();
        (volume / total as f64, market_cap / total as f64)
    };

    let mut gainers = records.to_vec();
    gainers.sort_by(|a, b| {
        b.price_1hr_change
            .partial_cmp(&a.price_1hr_change)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    gainers.truncate(METRICS_TOP_N);

    let mut by_volume = records.to_vec();
    by_volume.sort_by(|a, b| {
        b.volume_sol
            .partial_cmp(&a.volume_sol)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    by_volume.truncate(METRICS_TOP_N);

    TokenMetrics {
        total_tokens: total,
        average_volume,
        average_market_cap,
        top_gainers: gainers,
        top_volume: by_volume,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::apis::client::RateLimiterStatus;
    use crate::apis::stats::ApiStats;
    use crate::errors::ApiError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn idle_status(name: &str) -> RateLimiterStatus {
        RateLimiterStatus {
            name: name.to_string(),
            current_requests: 0,
            limit: 60,
            queue_size: 0,
            reset_time: 0,
        }
    }

    pub struct StubSource {
        pub name: &'static str,
        pub result: Mutex<Result<Vec<TokenRecord>, ApiError>>,
        pub calls: AtomicUsize,
        pub panics: bool,
    }

    impl StubSource {
        pub fn ok(name: &'static str, tokens: Vec<TokenRecord>) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Mutex::new(Ok(tokens)),
                calls: AtomicUsize::new(0),
                panics: false,
            })
        }

        pub fn failing(name: &'static str, error: ApiError) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Mutex::new(Err(error)),
                calls: AtomicUsize::new(0),
                panics: false,
            })
        }

        pub fn panicking(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Mutex::new(Ok(Vec::new())),
                calls: AtomicUsize::new(0),
                panics: true,
            })
        }

        pub fn set_tokens(&self, tokens: Vec<TokenRecord>) {
            *self.result.lock() = Ok(tokens);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_tokens(&self) -> Result<Vec<TokenRecord>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("provider exploded");
            }
            self.result.lock().clone()
        }

        fn rate_limiter_status(&self) -> RateLimiterStatus {
            idle_status(self.name)
        }

        fn stats(&self) -> ApiStats {
            ApiStats::default()
        }
    }

    pub struct StubOracle {
        pub result: Result<Option<HashMap<String, f64>>, ApiError>,
        pub requested: Mutex<Vec<String>>,
    }

    impl StubOracle {
        pub fn prices(prices: &[(&str, f64)]) -> Arc<Self> {
            let map = prices.iter().map(|(a, p)| (a.to_string(), *p)).collect();
            Arc::new(Self {
                result: Ok(Some(map)),
                requested: Mutex::new(Vec::new()),
            })
        }

        pub fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                result: Ok(None),
                requested: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(error: ApiError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PriceOracle for StubOracle {
        fn name(&self) -> &str {
            SOURCE_JUPITER
        }

        async fn fetch_prices(
            &self,
            addresses: &[String],
        ) -> Result<Option<HashMap<String, f64>>, ApiError> {
            self.requested.lock().extend(addresses.iter().cloned());
            self.result.clone()
        }

        fn rate_limiter_status(&self) -> RateLimiterStatus {
            idle_status(SOURCE_JUPITER)
        }

        fn stats(&self) -> ApiStats {
            ApiStats::default()
        }
    }

    pub fn engine(
        search: Arc<StubSource>,
        trending: Arc<StubSource>,
        oracle: Arc<StubOracle>,
    ) -> AggregationEngine {
        AggregationEngine::new(
            Arc::new(CacheStore::in_memory(30)),
            search,
            trending,
            oracle,
            AggregationConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{engine, StubOracle, StubSource};
    use super::*;
    use crate::tokens::types::fixtures::{record, with_volume};
    use crate::tokens::types::{SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL};

    fn dex(address: &str, price: f64) -> TokenRecord {
        let mut token = record(address, SOURCE_DEXSCREENER);
        token.price_sol = price;
        token
    }

    #[tokio::test]
    async fn test_unauthorized_oracle_keeps_provider_prices() {
        let search = StubSource::ok(SOURCE_DEXSCREENER, vec![dex("X", 0.5)]);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let engine = engine(search, trending, StubOracle::unavailable());

        let tokens = engine.aggregate().await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].price_sol, 0.5);
        assert_eq!(tokens[0].sources, vec![SOURCE_DEXSCREENER]);
    }

    #[tokio::test]
    async fn test_oracle_error_keeps_provider_prices() {
        let search = StubSource::ok(SOURCE_DEXSCREENER, vec![dex("X", 0.5)]);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let engine = engine(
            search,
            trending,
            StubOracle::failing(ApiError::DnsFailure("no such host".into())),
        );

        let tokens = engine.aggregate().await;
        assert_eq!(tokens[0].price_sol, 0.5);
        assert!(!tokens[0].has_source(SOURCE_JUPITER));
    }

    #[test]
    fn test_oracle_outages_log_below_warning() {
        assert_eq!(enrichment_failure_level(&ApiError::Unauthorized), LogLevel::Debug);
        assert_eq!(
            enrichment_failure_level(&ApiError::DnsFailure("no such host".into())),
            LogLevel::Debug
        );
        assert_eq!(enrichment_failure_level(&ApiError::Disabled), LogLevel::Debug);
        assert_eq!(enrichment_failure_level(&ApiError::Timeout), LogLevel::Warning);
        assert_eq!(
            enrichment_failure_level(&ApiError::from_status(503, String::new())),
            LogLevel::Warning
        );
    }

    #[tokio::test]
    async fn test_enrichment_overwrites_price_case_insensitively() {
        let search = StubSource::ok(SOURCE_DEXSCREENER, vec![dex("MintA", 0.5), dex("MintB", 0.7)]);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let engine = engine(search, trending, StubOracle::prices(&[("minta", 0.9)]));

        let tokens = engine.aggregate().await;
        assert_eq!(tokens[0].price_sol, 0.9);
        assert_eq!(tokens[0].sources, vec![SOURCE_DEXSCREENER, SOURCE_JUPITER]);
        assert_eq!(tokens[1].price_sol, 0.7);
        assert!(!tokens[1].has_source(SOURCE_JUPITER));
    }

    #[tokio::test]
    async fn test_enrichment_is_capped() {
        let many: Vec<TokenRecord> = (0..150).map(|i| dex(&format!("m{}", i), 1.0)).collect();
        let search = StubSource::ok(SOURCE_DEXSCREENER, many);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let oracle = StubOracle::prices(&[]);
        let engine = engine(search, trending, oracle.clone());

        let tokens = engine.aggregate().await;
        assert_eq!(tokens.len(), 150);
        assert_eq!(oracle.requested.lock().len(), 100);
    }

    #[tokio::test]
    async fn test_failed_branch_contributes_nothing() {
        let search = StubSource::failing(SOURCE_DEXSCREENER, ApiError::Timeout);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![record("g1", SOURCE_GECKOTERMINAL)]);
        let engine = engine(search, trending, StubOracle::unavailable());

        let tokens = engine.aggregate().await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_address, "g1");
    }

    #[tokio::test]
    async fn test_search_merges_before_trending() {
        let mut from_search = dex("Same", 0.5);
        from_search.protocol = "raydium".to_string();
        let mut from_trending = record("same", SOURCE_GECKOTERMINAL);
        from_trending.protocol = SOURCE_GECKOTERMINAL.to_string();

        let engine = engine(
            StubSource::ok(SOURCE_DEXSCREENER, vec![from_search]),
            StubSource::ok(SOURCE_GECKOTERMINAL, vec![from_trending]),
            StubOracle::unavailable(),
        );

        let tokens = engine.aggregate().await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_address, "Same");
        assert_eq!(tokens[0].protocol, SOURCE_GECKOTERMINAL);
        assert_eq!(tokens[0].sources, vec![SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL]);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let search = StubSource::ok(SOURCE_DEXSCREENER, vec![dex("X", 0.5)]);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let engine = engine(search.clone(), trending, StubOracle::unavailable());

        engine.aggregate().await;
        search.set_tokens(vec![dex("Y", 1.0)]);
        let tokens = engine.aggregate().await;

        assert_eq!(search.calls(), 1);
        assert_eq!(tokens[0].token_address, "X");

        engine.invalidate_cache().await;
        let tokens = engine.aggregate().await;
        assert_eq!(search.calls(), 2);
        assert_eq!(tokens[0].token_address, "Y");
    }

    #[tokio::test]
    async fn test_empty_result_is_not_served_from_cache() {
        let search = StubSource::ok(SOURCE_DEXSCREENER, vec![]);
        let trending = StubSource::ok(SOURCE_GECKOTERMINAL, vec![]);
        let engine = engine(search.clone(), trending, StubOracle::unavailable());

        assert!(engine.aggregate().await.is_empty());
        assert!(engine.aggregate().await.is_empty());
        assert_eq!(search.calls(), 2);
    }

    #[tokio::test]
    async fn test_panic_degrades_to_empty() {
        let engine = engine(
            StubSource::panicking(SOURCE_DEXSCREENER),
            StubSource::ok(SOURCE_GECKOTERMINAL, vec![record("g", SOURCE_GECKOTERMINAL)]),
            StubOracle::unavailable(),
        );
        assert!(engine.aggregate().await.is_empty());
    }

    #[tokio::test]
    async fn test_find_token_is_case_insensitive() {
        let engine = engine(
            StubSource::ok(SOURCE_DEXSCREENER, vec![dex("MintABC", 0.5)]),
            StubSource::ok(SOURCE_GECKOTERMINAL, vec![]),
            StubOracle::unavailable(),
        );
        assert!(engine.find_token("mintabc").await.is_some());
        assert!(engine.find_token("missing").await.is_none());
    }

    #[test]
    fn test_metrics() {
        let empty = compute_metrics(&[]);
        assert_eq!(empty.total_tokens, 0);
        assert_eq!(empty.average_volume, 0.0);

        let mut records: Vec<TokenRecord> =
            (0..7).map(|i| with_volume(&format!("v{}", i), i as f64 * 10.0)).collect();
        records[2].price_1hr_change = 50.0;
        let metrics = compute_metrics(&records);

        assert_eq!(metrics.total_tokens, 7);
        assert_eq!(metrics.average_volume, 30.0);
        assert_eq!(metrics.top_volume.len(), 5);
        assert_eq!(metrics.top_volume[0].token_address, "v6");
        assert_eq!(metrics.top_gainers[0].token_address, "v2");
    }
}
