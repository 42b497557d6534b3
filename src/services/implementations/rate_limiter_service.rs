use crate::context::AppContext;
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Drives the 60 s window of every provider's rate limiter
pub struct RateLimiterService {
    context: Arc<AppContext>,
}

impl RateLimiterService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Service for RateLimiterService {
    fn name(&self) -> &'static str {
        "rate_limiters"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn start(&mut self, _shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        self.context.apis.start_rate_limiters();
        logger::debug(LogTag::RateLimit, "Provider rate limiters running");
        Ok(vec![])
    }

    async fn stop(&mut self) -> Result<(), String> {
        self.context.apis.stop_rate_limiters();
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        let health = self.context.apis.provider_health();
        let saturated: Vec<String> = [health.dexscreener, health.geckoterminal, health.jupiter]
            .into_iter()
            .filter(|p| p.rate_limiter.queue_size > 0)
            .map(|p| p.rate_limiter.name)
            .collect();

        if saturated.is_empty() {
            ServiceHealth::Healthy
        } else {
            ServiceHealth::Degraded(format!("callers queued on: {}", saturated.join(", ")))
        }
    }
}
