/// Jupiter price oracle client
///
/// API Documentation: https://station.jup.ag/docs/apis/price-api-v2
///
/// Endpoint used: /price/v2?ids={csv}&vsToken={SOL mint}
///
/// Used only for enrichment. Authentication failures and empty responses are
/// reported as "unavailable" (`Ok(None)`), never as aggregation errors.
pub mod types;

pub use self::types::{PriceEntry, PriceResponse};

use super::client::{ApiTransport, RateLimiterStatus};
use super::retry::RetryPolicy;
use super::stats::ApiStats;
use crate::config::JupiterConfig;
use crate::errors::{ApiError, ConfigError};
use crate::logger::{self, LogTag};
use crate::tokens::sources::PriceOracle;
use crate::tokens::types::SOURCE_JUPITER;
use async_trait::async_trait;
use std::collections::HashMap;

/// Wrapped SOL mint; quoting against it yields SOL-denominated prices
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub struct JupiterClient {
    transport: ApiTransport,
    base_url: String,
    max_ids_per_request: usize,
}

impl JupiterClient {
    pub fn new(config: &JupiterConfig, retry: RetryPolicy) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: ApiTransport::new(
                SOURCE_JUPITER,
                config.enabled,
                config.rate_limit_per_minute,
                config.timeout_secs,
                retry,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_ids_per_request: config.max_ids_per_request.max(1),
        })
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }
}

#[async_trait]
impl PriceOracle for JupiterClient {
    fn name(&self) -> &str {
        SOURCE_JUPITER
    }

    async fn fetch_prices(
        &self,
        addresses: &[String],
    ) -> Result<Option<HashMap<String, f64>>, ApiError> {
        let ids: Vec<&str> = addresses
            .iter()
            .take(self.max_ids_per_request)
            .map(String::as_str)
            .collect();
        if ids.is_empty() {
            return Ok(Some(HashMap::new()));
        }

        logger::debug(
            LogTag::Api,
            &format!("Fetching prices from Jupiter for {} tokens", ids.len()),
        );

        let query = [("ids", ids.join(",")), ("vsToken", SOL_MINT.to_string())];
        let result: Result<PriceResponse, ApiError> =
            self.transport.get_json("price", &self.base_url, &query).await;

        classify_price_result(result)
    }

    fn rate_limiter_status(&self) -> RateLimiterStatus {
        self.transport.rate_limiter_status()
    }

    fn stats(&self) -> ApiStats {
        self.transport.stats()
    }
}

/// Map a Jupiter response onto the oracle contract
///
/// An empty price map and an authentication failure both mean "enrichment
/// unavailable" (`Ok(None)`). Every other error is returned to the caller.
fn classify_price_result(
    result: Result<PriceResponse, ApiError>,
) -> Result<Option<HashMap<String, f64>>, ApiError> {
    match result {
        Ok(response) => {
            let prices = response.into_prices();
            if prices.is_empty() {
                logger::debug(LogTag::Api, "Jupiter: no price data returned");
                return Ok(None);
            }
            logger::info(
                LogTag::Api,
                &format!("Jupiter: fetched prices for {} tokens", prices.len()),
            );
            Ok(Some(prices))
        }
        Err(ApiError::Unauthorized) => {
            logger::debug(
                LogTag::Api,
                "Jupiter API requires authentication - price enrichment disabled",
            );
            Ok(None)
        }
        Err(err) => {
            if err.is_unavailable() {
                logger::debug(
                    LogTag::Api,
                    &format!("Jupiter API temporarily unavailable: {}", err),
                );
            }
            Err(err)
        }
    }
}
