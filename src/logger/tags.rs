/// Log tags identify the subsystem a message comes from
///
/// The debug key (lower-case) is what `--debug <tags>` matches against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Api,
    RateLimit,
    Cache,
    Aggregator,
    Pagination,
    Broadcast,
    Service,
    Webserver,
    Websocket,
    /// Records forwarded from third-party crates through the `log` facade
    External,
    Other(String),
}

impl LogTag {
    /// Key used for per-tag debug filtering
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Api => "api".to_string(),
            LogTag::RateLimit => "ratelimit".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Aggregator => "aggregator".to_string(),
            LogTag::Pagination => "pagination".to_string(),
            LogTag::Broadcast => "broadcast".to_string(),
            LogTag::Service => "service".to_string(),
            LogTag::Webserver => "webserver".to_string(),
            LogTag::Websocket => "websocket".to_string(),
            LogTag::External => "external".to_string(),
            LogTag::Other(name) => name.to_lowercase(),
        }
    }

    /// Short upper-case label printed in the tag column
    pub fn label(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Api => "API".to_string(),
            LogTag::RateLimit => "RATELIMIT".to_string(),
            LogTag::Cache => "CACHE".to_string(),
            LogTag::Aggregator => "AGGREGATE".to_string(),
            LogTag::Pagination => "PAGINATE".to_string(),
            LogTag::Broadcast => "BROADCAST".to_string(),
            LogTag::Service => "SERVICE".to_string(),
            LogTag::Webserver => "WEBSERVER".to_string(),
            LogTag::Websocket => "WS".to_string(),
            LogTag::External => "EXTERNAL".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }
}
