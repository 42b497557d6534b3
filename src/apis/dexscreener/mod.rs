/// DexScreener search client
///
/// API Documentation: https://docs.dexscreener.com/api/reference
///
/// Endpoint used: /latest/dex/search?q={query}
pub mod types;

pub use self::types::{DexScreenerPair, SearchResponse};

use super::client::{ApiTransport, RateLimiterStatus};
use super::retry::RetryPolicy;
use super::stats::ApiStats;
use crate::config::DexScreenerConfig;
use crate::errors::{ApiError, ConfigError};
use crate::logger::{self, LogTag};
use crate::tokens::sources::MarketDataSource;
use crate::tokens::types::{TokenRecord, SOURCE_DEXSCREENER};
use async_trait::async_trait;
use chrono::Utc;

use self::types::PairPriceChange;

pub struct DexScreenerClient {
    transport: ApiTransport,
    base_url: String,
    search_query: String,
    chain_id: String,
    max_results: usize,
    sol_usd_rate: f64,
}

impl DexScreenerClient {
    pub fn new(
        config: &DexScreenerConfig,
        retry: RetryPolicy,
        sol_usd_rate: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: ApiTransport::new(
                SOURCE_DEXSCREENER,
                config.enabled,
                config.rate_limit_per_minute,
                config.timeout_secs,
                retry,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_query: config.search_query.clone(),
            chain_id: config.chain_id.clone(),
            max_results: config.max_results,
            sol_usd_rate,
        })
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    /// Raw search results across every chain
    pub async fn search_pairs(&self, query: &str) -> Result<Vec<DexScreenerPair>, ApiError> {
        let url = format!("{}/search", self.base_url);
        let response: SearchResponse = self
            .transport
            .get_json("search", &url, &[("q", query.to_string())])
            .await?;

        let pairs = response.pairs.unwrap_or_default();
        logger::info(
            LogTag::Api,
            &format!("DexScreener search '{}': found {} pairs", query, pairs.len()),
        );
        Ok(pairs)
    }
}

#[async_trait]
impl MarketDataSource for DexScreenerClient {
    fn name(&self) -> &str {
        SOURCE_DEXSCREENER
    }

    async fn fetch_tokens(&self) -> Result<Vec<TokenRecord>, ApiError> {
        let pairs = self.search_pairs(&self.search_query).await?;
        let now = Utc::now().timestamp_millis();

        Ok(pairs
            .iter()
            .filter(|pair| pair.chain_id == self.chain_id)
            .take(self.max_results)
            .map(|pair| shape_pair(pair, self.sol_usd_rate, now))
            .collect())
    }

    fn rate_limiter_status(&self) -> RateLimiterStatus {
        self.transport.rate_limiter_status()
    }

    fn stats(&self) -> ApiStats {
        self.transport.stats()
    }
}

// ============================================================================
// SHAPING
// ============================================================================

/// Map one search pair into a canonical record
///
/// `priceNative` is already SOL-denominated for SOL-quoted pairs. USD fields
/// (volume, liquidity, market cap) are converted with `sol_usd_rate`.
pub fn shape_pair(pair: &DexScreenerPair, sol_usd_rate: f64, now_ms: i64) -> TokenRecord {
    let price_change = pair.price_change.clone().unwrap_or_default();
    let h24_txns = pair
        .txns
        .as_ref()
        .and_then(|txns| txns.h24)
        .unwrap_or_default();

    let volume_usd = pair.volume.as_ref().and_then(|v| v.h24);
    let liquidity_usd = pair.liquidity.as_ref().and_then(|l| l.usd);

    TokenRecord {
        token_address: pair.base_token.address.clone(),
        token_name: pair.base_token.name.clone(),
        token_ticker: pair.base_token.symbol.clone(),
        price_sol: non_negative(pair.price_native.as_deref().and_then(|p| p.parse().ok())),
        market_cap_sol: usd_to_sol(pair.market_cap, sol_usd_rate),
        volume_sol: usd_to_sol(volume_usd, sol_usd_rate),
        liquidity_sol: usd_to_sol(liquidity_usd, sol_usd_rate),
        transaction_count: h24_txns.buys + h24_txns.sells,
        price_1hr_change: finite_or_zero(price_change.h1),
        price_24hr_change: Some(finite_or_zero(price_change.h24)),
        price_7d_change: Some(pair_seven_day_change(&price_change)),
        protocol: pair.dex_id.clone(),
        sources: vec![SOURCE_DEXSCREENER.to_string()],
        last_updated: now_ms,
    }
}

/// 7-day momentum for a pair: d7, else w1, else h24, else 0
pub fn pair_seven_day_change(change: &PairPriceChange) -> f64 {
    change
        .d7
        .or(change.w1)
        .or(change.h24)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub(crate) fn usd_to_sol(usd: Option<f64>, sol_usd_rate: f64) -> f64 {
    if sol_usd_rate <= 0.0 {
        return 0.0;
    }
    non_negative(usd) / sol_usd_rate
}

pub(crate) fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_from_json(json: &str) -> DexScreenerPair {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_shape_full_pair() {
        let pair = pair_from_json(
            r#"{
                "chainId": "solana",
                "dexId": "raydium",
                "pairAddress": "Pair111",
                "baseToken": {"address": "Mint111", "name": "Bonk", "symbol": "BONK"},
                "priceNative": "0.0000002",
                "priceUsd": "0.00002",
                "txns": {"h24": {"buys": 120, "sells": 80}},
                "volume": {"h24": 50000.0},
                "priceChange": {"h1": 1.5, "h24": -3.0, "d7": 12.0},
                "liquidity": {"usd": 20000.0},
                "marketCap": 1000000.0
            }"#,
        );

        let record = shape_pair(&pair, 100.0, 42);
        assert_eq!(record.token_address, "Mint111");
        assert_eq!(record.token_ticker, "BONK");
        assert_eq!(record.price_sol, 0.0000002);
        assert_eq!(record.volume_sol, 500.0);
        assert_eq!(record.liquidity_sol, 200.0);
        assert_eq!(record.market_cap_sol, 10000.0);
        assert_eq!(record.transaction_count, 200);
        assert_eq!(record.price_1hr_change, 1.5);
        assert_eq!(record.price_24hr_change, Some(-3.0));
        assert_eq!(record.price_7d_change, Some(12.0));
        assert_eq!(record.protocol, "raydium");
        assert_eq!(record.sources, vec![SOURCE_DEXSCREENER]);
        assert_eq!(record.last_updated, 42);
    }

    #[test]
    fn test_shape_sparse_pair_defaults_to_zero() {
        let pair = pair_from_json(
            r#"{
                "chainId": "solana",
                "baseToken": {"address": "Mint222"}
            }"#,
        );

        let record = shape_pair(&pair, 100.0, 0);
        assert_eq!(record.price_sol, 0.0);
        assert_eq!(record.volume_sol, 0.0);
        assert_eq!(record.transaction_count, 0);
        assert_eq!(record.price_1hr_change, 0.0);
        assert_eq!(record.price_24hr_change, Some(0.0));
        assert_eq!(record.price_7d_change, Some(0.0));
    }

    #[test]
    fn test_unparseable_price_is_zero() {
        let pair = pair_from_json(
            r#"{"chainId": "solana", "baseToken": {"address": "M"}, "priceNative": "n/a"}"#,
        );
        assert_eq!(shape_pair(&pair, 100.0, 0).price_sol, 0.0);
    }

    #[test]
    fn test_seven_day_fallback_chain() {
        let mut change = PairPriceChange {
            h1: None,
            h24: Some(2.0),
            d7: None,
            w1: Some(5.0),
        };
        assert_eq!(pair_seven_day_change(&change), 5.0);

        change.w1 = None;
        assert_eq!(pair_seven_day_change(&change), 2.0);

        change.d7 = Some(-7.0);
        assert_eq!(pair_seven_day_change(&change), -7.0);

        assert_eq!(pair_seven_day_change(&PairPriceChange::default()), 0.0);
    }

    #[test]
    fn test_search_response_without_pairs() {
        let response: SearchResponse = serde_json::from_str(r#"{"schemaVersion": "1.0.0", "pairs": null}"#).unwrap();
        assert!(response.pairs.is_none());
    }
}
