/// Jupiter price API v2 payload
///
/// Prices are returned as decimal strings; older deployments used plain
/// numbers, so both are accepted. Unknown ids map to `null`.
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    #[serde(default)]
    pub data: Option<HashMap<String, Option<PriceEntry>>>,
    #[serde(default)]
    pub time_taken: Option<f64>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct PriceEntry {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub price_type: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub price: f64,
}

impl PriceResponse {
    /// Address → price for every entry with a usable price
    pub fn into_prices(self) -> HashMap<String, f64> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(address, entry)| {
                entry
                    .map(|e| e.price)
                    .filter(|price| price.is_finite() && *price >= 0.0)
                    .map(|price| (address, price))
            })
            .collect()
    }
}
