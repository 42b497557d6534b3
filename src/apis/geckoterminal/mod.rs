/// GeckoTerminal trending pools client
///
/// API Documentation: https://www.geckoterminal.com/dex-api
///
/// Endpoint used: /networks/{network}/trending_pools
pub mod types;

pub use self::types::{GeckoTerminalPool, TrendingPoolsResponse};

use super::client::{ApiTransport, RateLimiterStatus};
use super::dexscreener::usd_to_sol;
use super::retry::RetryPolicy;
use super::stats::ApiStats;
use crate::config::GeckoTerminalConfig;
use crate::errors::{ApiError, ConfigError};
use crate::logger::{self, LogTag};
use crate::tokens::sources::MarketDataSource;
use crate::tokens::types::{TokenRecord, SOURCE_GECKOTERMINAL};
use async_trait::async_trait;
use chrono::Utc;

pub struct GeckoTerminalClient {
    transport: ApiTransport,
    base_url: String,
    network: String,
    max_results: usize,
    sol_usd_rate: f64,
}

impl GeckoTerminalClient {
    pub fn new(
        config: &GeckoTerminalConfig,
        retry: RetryPolicy,
        sol_usd_rate: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: ApiTransport::new(
                SOURCE_GECKOTERMINAL,
                config.enabled,
                config.rate_limit_per_minute,
                config.timeout_secs,
                retry,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            network: config.network.clone(),
            max_results: config.max_results,
            sol_usd_rate,
        })
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    /// Raw trending pools for the configured network
    pub async fn fetch_trending_pools(&self) -> Result<Vec<GeckoTerminalPool>, ApiError> {
        let endpoint = format!("networks/{}/trending_pools", self.network);
        let url = format!("{}/{}", self.base_url, endpoint);
        let response: TrendingPoolsResponse = self.transport.get_json(&endpoint, &url, &[]).await?;

        logger::info(
            LogTag::Api,
            &format!("GeckoTerminal: found {} trending pools", response.data.len()),
        );
        Ok(response.data)
    }
}

#[async_trait]
impl MarketDataSource for GeckoTerminalClient {
    fn name(&self) -> &str {
        SOURCE_GECKOTERMINAL
    }

    async fn fetch_tokens(&self) -> Result<Vec<TokenRecord>, ApiError> {
        let pools = self.fetch_trending_pools().await?;
        let now = Utc::now().timestamp_millis();

        Ok(pools
            .iter()
            .take(self.max_results)
            .map(|pool| shape_pool(pool, &self.network, self.sol_usd_rate, now))
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

/// Map one trending entry into a canonical record
///
/// All money fields are USD strings converted with `sol_usd_rate`. Momentum is
/// not taken from this provider and stays at zero.
pub fn shape_pool(pool: &GeckoTerminalPool, network: &str, sol_usd_rate: f64, now_ms: i64) -> TokenRecord {
    let attrs = &pool.attributes;
    let parse = |value: &Option<String>| value.as_deref().and_then(|s| s.trim().parse::<f64>().ok());

    TokenRecord {
        token_address: token_address(pool, network),
        token_name: attrs.name.clone(),
        token_ticker: ticker(pool),
        price_sol: usd_to_sol(parse(&attrs.price_usd), sol_usd_rate),
        market_cap_sol: usd_to_sol(parse(&attrs.market_cap_usd), sol_usd_rate),
        volume_sol: usd_to_sol(
            attrs.volume_usd.as_ref().and_then(|v| parse(&v.h24)),
            sol_usd_rate,
        ),
        liquidity_sol: usd_to_sol(parse(&attrs.total_reserve_in_usd), sol_usd_rate),
        transaction_count: 0,
        price_1hr_change: 0.0,
        price_24hr_change: Some(0.0),
        price_7d_change: Some(0.0),
        protocol: SOURCE_GECKOTERMINAL.to_string(),
        sources: vec![SOURCE_GECKOTERMINAL.to_string()],
        last_updated: now_ms,
    }
}

/// Base token mint from relationships, else the entry's own address
fn token_address(pool: &GeckoTerminalPool, network: &str) -> String {
    let prefix = format!("{}_", network);
    pool.relationships
        .as_ref()
        .and_then(|rels| rels.base_token.as_ref())
        .map(|base| base.data.id.as_str())
        .map(|id| id.strip_prefix(&prefix).unwrap_or(id).to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| pool.attributes.address.clone())
}

/// Explicit symbol, else the base side of a "BASE / QUOTE" pool name
fn ticker(pool: &GeckoTerminalPool) -> String {
    if let Some(symbol) = pool.attributes.symbol.as_ref().filter(|s| !s.is_empty()) {
        return symbol.clone();
    }
    pool.attributes
        .name
        .split(" / ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_from_json(json: &str) -> GeckoTerminalPool {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_shape_token_style_entry() {
        let pool = pool_from_json(
            r#"{
                "id": "solana_Mint111",
                "type": "token",
                "attributes": {
                    "address": "Mint111",
                    "name": "Bonk",
                    "symbol": "BONK",
                    "price_usd": "0.5",
                    "volume_usd": {"h24": "25000"},
                    "market_cap_usd": "1000000",
                    "total_reserve_in_usd": "3000"
                }
            }"#,
        );

        let record = shape_pool(&pool, "solana", 100.0, 7);
        assert_eq!(record.token_address, "Mint111");
        assert_eq!(record.token_ticker, "BONK");
        assert_eq!(record.price_sol, 0.005);
        assert_eq!(record.volume_sol, 250.0);
        assert_eq!(record.market_cap_sol, 10000.0);
        assert_eq!(record.liquidity_sol, 30.0);
        assert_eq!(record.price_1hr_change, 0.0);
        assert_eq!(record.price_24hr_change, Some(0.0));
        assert_eq!(record.protocol, SOURCE_GECKOTERMINAL);
        assert_eq!(record.sources, vec![SOURCE_GECKOTERMINAL]);
    }

    #[test]
    fn test_shape_pool_style_entry_uses_base_token() {
        let pool = pool_from_json(
            r#"{
                "id": "solana_Pool999",
                "type": "pool",
                "attributes": {
                    "address": "Pool999",
                    "name": "WIF / SOL",
                    "base_token_price_usd": "2.0",
                    "reserve_in_usd": "500",
                    "market_cap_usd": null,
                    "volume_usd": {"h24": "1000"}
                },
                "relationships": {
                    "base_token": {"data": {"id": "solana_MintWif", "type": "token"}},
                    "dex": {"data": {"id": "raydium", "type": "dex"}}
                }
            }"#,
        );

        let record = shape_pool(&pool, "solana", 100.0, 0);
        assert_eq!(record.token_address, "MintWif");
        assert_eq!(record.token_ticker, "WIF");
        assert_eq!(record.price_sol, 0.02);
        assert_eq!(record.liquidity_sol, 5.0);
        assert_eq!(record.market_cap_sol, 0.0);
    }

    #[test]
    fn test_garbage_numbers_default_to_zero() {
        let pool = pool_from_json(
            r#"{"attributes": {"address": "M", "name": "X", "price_usd": "abc", "market_cap_usd": "-5"}}"#,
        );
        let record = shape_pool(&pool, "solana", 100.0, 0);
        assert_eq!(record.price_sol, 0.0);
        assert_eq!(record.market_cap_sol, 0.0);
        assert_eq!(record.token_address, "M");
    }
}
