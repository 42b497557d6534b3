//! External market data providers
//!
//! Each client owns an [`client::ApiTransport`] (rate limiter, retry policy,
//! stats) and a pure shaping function from its wire schema into
//! [`crate::tokens::TokenRecord`].

pub mod client;
pub mod dexscreener;
pub mod geckoterminal;
pub mod jupiter;
pub mod manager;
pub mod retry;
pub mod stats;

pub use client::{ApiTransport, HttpClient, RateLimiter, RateLimiterStatus};
pub use dexscreener::DexScreenerClient;
pub use geckoterminal::GeckoTerminalClient;
pub use jupiter::JupiterClient;
pub use manager::{ApiManager, ApiManagerHealth, ProviderHealth};
pub use retry::RetryPolicy;
pub use stats::{ApiStats, ApiStatsTracker};
