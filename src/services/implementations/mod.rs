mod broadcaster_service;
mod cache_service;
mod rate_limiter_service;
#[cfg(feature = "web")]
mod webserver_service;

pub use broadcaster_service::BroadcasterService;
pub use cache_service::CacheHealthService;
pub use rate_limiter_service::RateLimiterService;
#[cfg(feature = "web")]
pub use webserver_service::WebserverService;

use crate::context::AppContext;
use crate::services::ServiceManager;
use std::sync::Arc;

/// Register every service against the shared context
pub fn register_all(manager: &mut ServiceManager, context: &Arc<AppContext>) {
    manager.register(Box::new(RateLimiterService::new(context.clone())));
    manager.register(Box::new(CacheHealthService::new(context.clone())));
    manager.register(Box::new(BroadcasterService::new(context.clone())));
    #[cfg(feature = "web")]
    manager.register(Box::new(WebserverService::new(context.clone())));
}
