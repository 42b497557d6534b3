use crate::config::Config;
use crate::context::AppContext;
use crate::logger::{self, LogTag};
use crate::services::Service;
use crate::webserver::server;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct WebserverService {
    context: Arc<AppContext>,
}

impl WebserverService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Service for WebserverService {
    fn name(&self) -> &'static str {
        "webserver"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rate_limiters"]
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.server.enabled
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        // Bind before spawning so port errors fail startup instead of a background task
        let listener = server::bind(&self.context).await?;
        let context = self.context.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, context, shutdown).await {
                logger::error(LogTag::Webserver, &format!("Webserver failed: {}", e));
            }
        });

        Ok(vec![handle])
    }
}
