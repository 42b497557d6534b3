/// GeckoTerminal trending pools payload
///
/// Numeric fields arrive as decimal strings (or null); they are parsed in the
/// shaping step.
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingPoolsResponse {
    #[serde(default)]
    pub data: Vec<GeckoTerminalPool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoTerminalPool {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub pool_type: String,
    pub attributes: GeckoTerminalAttributes,
    #[serde(default)]
    pub relationships: Option<GeckoTerminalRelationships>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoTerminalAttributes {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, alias = "base_token_price_usd")]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub volume_usd: Option<GeckoTerminalVolume>,
    #[serde(default)]
    pub market_cap_usd: Option<String>,
    #[serde(default)]
    pub fdv_usd: Option<String>,
    #[serde(default, alias = "reserve_in_usd")]
    pub total_reserve_in_usd: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeckoTerminalVolume {
    pub h24: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoTerminalRelationships {
    #[serde(default)]
    pub base_token: Option<GeckoTerminalRelationship>,
    #[serde(default)]
    pub dex: Option<GeckoTerminalRelationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoTerminalRelationship {
    pub data: GeckoTerminalRelationshipData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoTerminalRelationshipData {
    /// `{network}_{address}`
    pub id: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
}
