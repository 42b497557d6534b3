/// Composition root
///
/// Builds every long-lived component exactly once from [`Config`] and hands
/// out shared handles. Nothing else in the crate holds process-wide state
/// except the logger configuration.
use crate::apis::ApiManager;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};
use crate::services::broadcaster::{Broadcaster, TokenUpdate};
use crate::tokens::{AggregationEngine, MarketDataSource, PriceOracle};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

pub struct AppContext {
    pub config: Config,
    pub apis: Arc<ApiManager>,
    pub cache: Arc<CacheStore>,
    pub engine: Arc<AggregationEngine>,
    pub broadcaster: Arc<Broadcaster>,
    pub started_at: Instant,
}

impl AppContext {
    /// Build every component; connects to Redis when enabled
    pub async fn build(config: Config) -> Result<Arc<Self>, ConfigError> {
        let apis = Arc::new(ApiManager::new(&config)?);
        let cache = Arc::new(CacheStore::connect(&config.cache).await);

        let search: Arc<dyn MarketDataSource> = apis.dexscreener.clone();
        let trending: Arc<dyn MarketDataSource> = apis.geckoterminal.clone();
        let oracle: Arc<dyn PriceOracle> = apis.jupiter.clone();
        let engine = Arc::new(AggregationEngine::new(
            cache.clone(),
            search,
            trending,
            oracle,
            config.aggregation.clone(),
        ));

        let context = Self::from_parts(config, apis, cache, engine);
        logger::info(LogTag::System, "Application context ready");
        Ok(context)
    }

    /// Assemble a context from already-built components
    pub fn from_parts(
        config: Config,
        apis: Arc<ApiManager>,
        cache: Arc<CacheStore>,
        engine: Arc<AggregationEngine>,
    ) -> Arc<Self> {
        let (sender, _) = broadcast::channel::<TokenUpdate>(config.broadcast.channel_capacity.max(1));
        let broadcaster = Arc::new(Broadcaster::new(engine.clone(), sender, &config.broadcast));

        Arc::new(Self {
            config,
            apis,
            cache,
            engine,
            broadcaster,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
