/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro. Every section is
/// optional in the TOML file; missing fields take the defaults below.
use crate::config_struct;

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP / WebSocket server
    pub struct ServerConfig {
        enabled: bool = true,
        host: String = "0.0.0.0".to_string(),
        port: u16 = 3000,
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// Shared cache (Redis) with in-process fallback
    pub struct CacheConfig {
        /// When false the store runs on the in-process map only
        redis_enabled: bool = true,
        redis_url: String = "redis://localhost:6379".to_string(),
        /// Default entry TTL in seconds; 0 disables expiry
        ttl_secs: i64 = 30,
        /// Interval of the PING health probe while running
        health_check_interval_secs: u64 = 5,
        connect_timeout_secs: u64 = 5,
    }
}

// ============================================================================
// PROVIDER CONFIGURATION
// ============================================================================

config_struct! {
    /// DexScreener search provider
    pub struct DexScreenerConfig {
        enabled: bool = true,
        base_url: String = "https://api.dexscreener.com/latest/dex".to_string(),
        rate_limit_per_minute: u32 = 300,
        timeout_secs: u64 = 10,
        search_query: String = "SOL".to_string(),
        chain_id: String = "solana".to_string(),
        max_results: usize = 50,
    }
}

config_struct! {
    /// GeckoTerminal trending provider
    pub struct GeckoTerminalConfig {
        enabled: bool = true,
        base_url: String = "https://api.geckoterminal.com/api/v2".to_string(),
        rate_limit_per_minute: u32 = 300,
        timeout_secs: u64 = 10,
        network: String = "solana".to_string(),
        max_results: usize = 30,
    }
}

config_struct! {
    /// Jupiter price oracle
    pub struct JupiterConfig {
        enabled: bool = true,
        base_url: String = "https://api.jup.ag/price/v2".to_string(),
        rate_limit_per_minute: u32 = 600,
        timeout_secs: u64 = 10,
        /// Addresses per price request
        max_ids_per_request: usize = 100,
    }
}

config_struct! {
    /// Exponential backoff shared by every provider client
    pub struct RetryConfig {
        max_attempts: u32 = 5,
        base_delay_ms: u64 = 1000,
        /// Upper bound of the random jitter as a fraction of the delay
        jitter_ratio: f64 = 0.1,
    }
}

// ============================================================================
// AGGREGATION CONFIGURATION
// ============================================================================

config_struct! {
    /// Aggregation cycle and read path
    pub struct AggregationConfig {
        /// Approximate USD per SOL used to convert USD-denominated provider fields
        sol_usd_rate: f64 = 100.0,
        /// Leading records sent to the price oracle per cycle
        enrichment_limit: usize = 100,
        default_page_limit: usize = 20,
        max_page_limit: usize = 100,
    }
}

// ============================================================================
// BROADCAST CONFIGURATION
// ============================================================================

config_struct! {
    /// Periodic diff broadcaster feeding WebSocket clients
    pub struct BroadcastConfig {
        enabled: bool = true,
        interval_ms: u64 = 5000,
        /// Minimum absolute price move, percent
        price_change_threshold_pct: f64 = 1.0,
        /// Minimum volume increase, percent
        volume_spike_threshold_pct: f64 = 50.0,
        /// Tokens sent in the initial_data message on connect
        initial_snapshot_size: usize = 30,
        channel_capacity: usize = 1024,
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

config_struct! {
    pub struct LoggingConfig {
        level: String = "info".to_string(),
        /// Tags with debug output enabled ("all" for every tag)
        debug_tags: Vec<String> = Vec::new(),
        use_colors: bool = true,
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration
    pub struct Config {
        server: ServerConfig = ServerConfig::default(),
        cache: CacheConfig = CacheConfig::default(),
        dexscreener: DexScreenerConfig = DexScreenerConfig::default(),
        geckoterminal: GeckoTerminalConfig = GeckoTerminalConfig::default(),
        jupiter: JupiterConfig = JupiterConfig::default(),
        retry: RetryConfig = RetryConfig::default(),
        aggregation: AggregationConfig = AggregationConfig::default(),
        broadcast: BroadcastConfig = BroadcastConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}
