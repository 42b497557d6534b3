//! tokenscope: multi-provider token market data aggregator
//!
//! Pulls token market data from DexScreener, GeckoTerminal and Jupiter under
//! per-provider rate limits, merges it into one record per token, caches the
//! result (Redis with in-process fallback) and serves it over HTTP and a
//! WebSocket push channel.

pub mod apis;
pub mod arguments;
pub mod cache;
pub mod config;
pub mod context;
pub mod errors;
pub mod logger;
pub mod services;
pub mod tokens;
#[cfg(feature = "web")]
pub mod webserver;
