use crate::config::Config;
use crate::context::AppContext;
use crate::logger::{self, LogTag};
use crate::services::Service;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Ticks the update broadcaster until shutdown
pub struct BroadcasterService {
    context: Arc<AppContext>,
}

impl BroadcasterService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Service for BroadcasterService {
    fn name(&self) -> &'static str {
        "broadcaster"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rate_limiters"]
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.broadcast.enabled
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let broadcaster = self.context.broadcaster.clone();
        let period = Duration::from_millis(self.context.config.broadcast.interval_ms.max(100));

        let handle = tokio::spawn(async move {
            let stop = shutdown.notified();
            tokio::pin!(stop);

            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            logger::info(
                LogTag::Broadcast,
                &format!("Periodic updates started (interval: {}ms)", period.as_millis()),
            );

            loop {
                tokio::select! {
                    _ = &mut stop => {
                        logger::info(LogTag::Broadcast, "Broadcaster shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sent = broadcaster.tick().await;
                        if sent > 0 {
                            logger::debug(LogTag::Broadcast, &format!("Tick published {} updates", sent));
                        }
                    }
                }
            }
        });

        Ok(vec![handle])
    }
}
