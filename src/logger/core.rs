/// Core logging implementation with automatic filtering
use super::config::{with_logger_config, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Check against minimum log level threshold
/// 3. Debug level requires debug mode for that tag
pub fn should_log(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug {
        return config.is_debug_enabled_for(tag);
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    let use_colors = with_logger_config(|config| {
        should_log(config, &tag, level).then_some(config.use_colors)
    });

    if let Some(use_colors) = use_colors {
        super::format::format_and_log(&tag, level, message, use_colors);
    }
}
