/// DexScreener search payload
///
/// Only the fields the shaping step reads are modeled; everything is optional
/// because the provider omits sub-objects for thin pairs.
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexScreenerPair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexScreenerPair {
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: Option<String>,
    pub base_token: PairToken,
    #[serde(default)]
    pub price_native: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub txns: Option<PairTxns>,
    #[serde(default)]
    pub volume: Option<PairVolume>,
    #[serde(default)]
    pub price_change: Option<PairPriceChange>,
    #[serde(default)]
    pub liquidity: Option<PairLiquidity>,
    #[serde(default)]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairToken {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairTxns {
    pub h1: Option<TxnCounts>,
    pub h24: Option<TxnCounts>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TxnCounts {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairVolume {
    pub h1: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairPriceChange {
    pub h1: Option<f64>,
    pub h24: Option<f64>,
    pub d7: Option<f64>,
    pub w1: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairLiquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}
