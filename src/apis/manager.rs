/// API manager - owns one instance of every provider client
///
/// Built once by the composition root; every consumer shares the same clients
/// so rate limits and stats are process-wide.
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};

use super::client::{RateLimiter, RateLimiterStatus};
use super::dexscreener::DexScreenerClient;
use super::geckoterminal::GeckoTerminalClient;
use super::jupiter::JupiterClient;
use super::retry::RetryPolicy;
use super::stats::ApiStats;

pub struct ApiManager {
    pub dexscreener: Arc<DexScreenerClient>,
    pub geckoterminal: Arc<GeckoTerminalClient>,
    pub jupiter: Arc<JupiterClient>,
}

/// Health view of one provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub enabled: bool,
    pub rate_limiter: RateLimiterStatus,
    pub stats: ApiStats,
}

impl ApiManager {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let retry = RetryPolicy::from_config(&config.retry);
        let sol_usd_rate = config.aggregation.sol_usd_rate;

        logger::info(LogTag::Api, "Initializing API manager");

        let manager = Self {
            dexscreener: Arc::new(DexScreenerClient::new(
                &config.dexscreener,
                retry.clone(),
                sol_usd_rate,
            )?),
            geckoterminal: Arc::new(GeckoTerminalClient::new(
                &config.geckoterminal,
                retry.clone(),
                sol_usd_rate,
            )?),
            jupiter: Arc::new(JupiterClient::new(&config.jupiter, retry)?),
        };

        for (name, enabled) in [
            ("DexScreener", config.dexscreener.enabled),
            ("GeckoTerminal", config.geckoterminal.enabled),
            ("Jupiter", config.jupiter.enabled),
        ] {
            if !enabled {
                logger::warning(LogTag::Api, &format!("{} client disabled via configuration", name));
            }
        }

        Ok(manager)
    }

    fn rate_limiters(&self) -> [&Arc<RateLimiter>; 3] {
        [
            self.dexscreener.transport().rate_limiter(),
            self.geckoterminal.transport().rate_limiter(),
            self.jupiter.transport().rate_limiter(),
        ]
    }

    /// Start every limiter's window-reset task
    pub fn start_rate_limiters(&self) {
        for limiter in self.rate_limiters() {
            limiter.start();
        }
        logger::debug(LogTag::RateLimit, "Rate limiter window tasks started");
    }

    /// Stop the window-reset tasks and release queued callers
    pub fn stop_rate_limiters(&self) {
        for limiter in self.rate_limiters() {
            limiter.stop();
        }
        logger::debug(LogTag::RateLimit, "Rate limiter window tasks stopped");
    }

    /// Per-provider limiter status and request stats
    pub fn provider_health(&self) -> ApiManagerHealth {
        let health = |transport: &super::client::ApiTransport| ProviderHealth {
            enabled: transport.is_enabled(),
            rate_limiter: transport.rate_limiter_status(),
            stats: transport.stats(),
        };

        ApiManagerHealth {
            dexscreener: health(self.dexscreener.transport()),
            geckoterminal: health(self.geckoterminal.transport()),
            jupiter: health(self.jupiter.transport()),
        }
    }
}

/// Health of every provider, as served by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiManagerHealth {
    pub dexscreener: ProviderHealth,
    pub geckoterminal: ProviderHealth,
    pub jupiter: ProviderHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_from_default_config() {
        let manager = ApiManager::new(&Config::default()).unwrap();
        let health = manager.provider_health();

        assert_eq!(health.dexscreener.rate_limiter.limit, 300);
        assert_eq!(health.geckoterminal.rate_limiter.limit, 300);
        assert_eq!(health.jupiter.rate_limiter.limit, 600);
        assert_eq!(health.jupiter.rate_limiter.name, "Jupiter");
        assert!(health.dexscreener.enabled);
        assert_eq!(health.dexscreener.stats.total_requests, 0);

        manager.start_rate_limiters();
        manager.stop_rate_limiters();
    }

    #[test]
    fn test_zero_rate_limit_is_config_error() {
        let mut config = Config::default();
        config.jupiter.rate_limit_per_minute = 0;
        assert!(ApiManager::new(&config).is_err());
    }
}
