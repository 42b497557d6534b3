/// Command-line arguments for the tokenscope binary
///
/// Flags override the loaded configuration after environment overrides, so
/// the precedence is: CLI > environment > TOML file > defaults.
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "tokenscope")]
#[command(about = "Multi-provider token market data aggregator", long_about = None)]
pub struct Arguments {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// HTTP / WebSocket port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Minimum log level (error, warning, info, debug, verbose)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Comma-separated tags with debug output enabled, or "all"
    #[arg(long, value_name = "TAGS")]
    pub debug: Option<String>,

    /// Run the cache on the in-process store only
    #[arg(long)]
    pub no_redis: bool,
}

impl Arguments {
    /// Fold CLI overrides into the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(debug) = &self.debug {
            config.logging.debug_tags = debug
                .split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect();
        }
        if self.no_redis {
            config.cache.redis_enabled = false;
        }
    }
}
