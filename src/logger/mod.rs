//! Structured tagged logging for tokenscope
//!
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Minimum level from configuration or `LOG_LEVEL`
//! - Per-tag debug control via `--debug api,cache`
//! - Colored console output; third-party `log` records are bridged in
//!
//! ## Usage
//!
//! ```rust
//! use tokenscope::logger::{self, LogTag};
//!
//! logger::error(LogTag::Cache, "Redis unreachable");
//! logger::warning(LogTag::Pagination, "Invalid cursor, starting from 0");
//! logger::info(LogTag::Aggregator, "Aggregated 64 tokens");
//! logger::debug(LogTag::Api, "Request details: ..."); // Only with --debug api
//! ```

mod bridge;
mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger
///
/// Installs the configuration and the `log` crate bridge. Safe to call more
/// than once; only the first bridge installation takes effect.
pub fn init(config: LoggerConfig) {
    set_logger_config(config);
    bridge::install();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the minimum level allows it AND debug is enabled for the
/// tag (`--debug <tag>` or `--debug all`).
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
