/// Configuration loading, environment overrides and validation
use super::schemas::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};
use std::path::Path;
use std::str::FromStr;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

/// Load configuration for the process
///
/// 1. `.env` is loaded into the environment (missing file is fine)
/// 2. The TOML file is parsed; a missing file means all defaults
/// 3. Environment overrides are applied
/// 4. The result is validated
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    dotenv::dotenv().ok();

    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        parse_config(path, &contents)?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse TOML contents into a Config
pub fn parse_config(path: &str, contents: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(contents).map_err(|e| ConfigError::Parse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Apply the supported environment variables on top of `config`
///
/// `lookup` is `std::env::var` in production and a map in tests.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var(&lookup, "PORT")? {
        config.server.port = port;
    }
    if let Some(url) = lookup("REDIS_URL") {
        config.cache.redis_url = url;
    }
    if let Some(ttl) = parse_var(&lookup, "CACHE_TTL")? {
        config.cache.ttl_secs = ttl;
    }
    if let Some(limit) = parse_var(&lookup, "DEXSCREENER_RATE_LIMIT")? {
        config.dexscreener.rate_limit_per_minute = limit;
    }
    if let Some(limit) = parse_var(&lookup, "JUPITER_RATE_LIMIT")? {
        config.jupiter.rate_limit_per_minute = limit;
    }
    if let Some(limit) = parse_var(&lookup, "GECKOTERMINAL_RATE_LIMIT")? {
        config.geckoterminal.rate_limit_per_minute = limit;
    }
    if let Some(interval) = parse_var(&lookup, "WS_UPDATE_INTERVAL")? {
        config.broadcast.interval_ms = interval;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.logging.level = level;
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, format!("'{}': {}", raw, e))),
        None => Ok(None),
    }
}

/// Reject configurations the runtime cannot honor
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let limits = [
        ("dexscreener.rate_limit_per_minute", config.dexscreener.rate_limit_per_minute),
        ("geckoterminal.rate_limit_per_minute", config.geckoterminal.rate_limit_per_minute),
        ("jupiter.rate_limit_per_minute", config.jupiter.rate_limit_per_minute),
    ];
    for (field, value) in limits {
        if value == 0 {
            return Err(ConfigError::invalid(field, "rate limit must be greater than 0"));
        }
    }

    let timeouts = [
        ("dexscreener.timeout_secs", config.dexscreener.timeout_secs),
        ("geckoterminal.timeout_secs", config.geckoterminal.timeout_secs),
        ("jupiter.timeout_secs", config.jupiter.timeout_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::invalid(field, "timeout must be greater than 0"));
        }
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
    }

    let aggregation = &config.aggregation;
    if aggregation.default_page_limit == 0 {
        return Err(ConfigError::invalid(
            "aggregation.default_page_limit",
            "must be greater than 0",
        ));
    }
    if aggregation.max_page_limit < aggregation.default_page_limit {
        return Err(ConfigError::invalid(
            "aggregation.max_page_limit",
            format!(
                "{} is below default_page_limit {}",
                aggregation.max_page_limit, aggregation.default_page_limit
            ),
        ));
    }
    if !(aggregation.sol_usd_rate > 0.0) {
        return Err(ConfigError::invalid(
            "aggregation.sol_usd_rate",
            "must be a positive number",
        ));
    }

    if config.broadcast.interval_ms == 0 {
        return Err(ConfigError::invalid("broadcast.interval_ms", "must be greater than 0"));
    }
    if config.broadcast.channel_capacity == 0 {
        return Err(ConfigError::invalid(
            "broadcast.channel_capacity",
            "must be greater than 0",
        ));
    }

    Ok(())
}
