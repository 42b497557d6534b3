/// Runtime logger configuration
///
/// Held in a process-wide lock so every module can log without threading a
/// handle around. Written once at startup and read on every log call.
use super::levels::LogLevel;
use super::tags::LogTag;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped
    pub min_level: LogLevel,
    /// Tags with debug output enabled (lower-case debug keys)
    pub debug_tags: HashSet<String>,
    /// Enables debug output for every tag
    pub debug_all: bool,
    pub use_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            debug_all: false,
            use_colors: true,
        }
    }
}

impl LoggerConfig {
    /// Build from a level string and a comma-separated debug tag list
    ///
    /// Unknown levels fall back to Info. Any debug tag raises the minimum level
    /// to Debug so the tagged messages are not filtered out by the threshold.
    pub fn from_settings(level: &str, debug: Option<&str>) -> Self {
        let mut config = Self {
            min_level: LogLevel::from_str(level).unwrap_or(LogLevel::Info),
            ..Self::default()
        };

        if let Some(debug) = debug {
            for tag in debug.split(',').map(|t| t.trim().to_lowercase()) {
                if tag.is_empty() {
                    continue;
                }
                if tag == "all" {
                    config.debug_all = true;
                } else {
                    config.debug_tags.insert(tag);
                }
            }
        }

        if (config.debug_all || !config.debug_tags.is_empty())
            && config.min_level < LogLevel::Debug
        {
            config.min_level = LogLevel::Debug;
        }

        config
    }

    pub fn is_debug_enabled_for(&self, tag: &LogTag) -> bool {
        self.debug_all || self.debug_tags.contains(&tag.to_debug_key())
    }
}

static LOGGER_CONFIG: LazyLock<RwLock<LoggerConfig>> =
    LazyLock::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub(crate) fn with_logger_config<R>(f: impl FnOnce(&LoggerConfig) -> R) -> R {
    f(&LOGGER_CONFIG.read())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_parses_debug_tags() {
        let config = LoggerConfig::from_settings("info", Some("api, Cache,,"));
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.is_debug_enabled_for(&LogTag::Api));
        assert!(config.is_debug_enabled_for(&LogTag::Cache));
        assert!(!config.is_debug_enabled_for(&LogTag::Aggregator));
    }

    #[test]
    fn test_from_settings_debug_all() {
        let config = LoggerConfig::from_settings("warning", Some("all"));
        assert!(config.debug_all);
        assert!(config.is_debug_enabled_for(&LogTag::Websocket));
    }

    #[test]
    fn test_unknown_level_defaults_to_info() {
        let config = LoggerConfig::from_settings("shouting", None);
        assert_eq!(config.min_level, LogLevel::Info);
        assert!(config.debug_tags.is_empty());
    }
}
