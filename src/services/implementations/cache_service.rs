use crate::config::Config;
use crate::context::AppContext;
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Periodic PING of the shared cache backend
pub struct CacheHealthService {
    context: Arc<AppContext>,
}

impl CacheHealthService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Service for CacheHealthService {
    fn name(&self) -> &'static str {
        "cache_health"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.cache.redis_enabled
    }

    async fn start(&mut self, _shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let interval = Duration::from_secs(self.context.config.cache.health_check_interval_secs.max(1));
        self.context.cache.start_health_monitor(interval);
        Ok(vec![])
    }

    async fn stop(&mut self) -> Result<(), String> {
        self.context.cache.disconnect();
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        if self.context.cache.is_ready() {
            ServiceHealth::Healthy
        } else {
            ServiceHealth::Degraded("using in-process fallback cache".to_string())
        }
    }
}
