/// Bridge from the `log` facade into the tagged logger
///
/// reqwest, redis and hyper report through `log`; their records land in the
/// same console sink under `LogTag::External`.
use super::config::with_logger_config;
use super::core::should_log;
use super::levels::LogLevel;
use super::tags::LogTag;

struct TaggedLogBridge;

static BRIDGE: TaggedLogBridge = TaggedLogBridge;

impl log::Log for TaggedLogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let level = LogLevel::from_log_level(metadata.level());
        with_logger_config(|config| should_log(config, &LogTag::External, level))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = LogLevel::from_log_level(record.level());
        let message = format!("{}: {}", record.target(), record.args());
        super::core::log_internal(LogTag::External, level, &message);
    }

    fn flush(&self) {}
}

/// Install the bridge as the global `log` logger
pub fn install() {
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}
