/// Change detection and fan-out of live token updates
///
/// Every tick the current aggregated set is diffed against the previous
/// snapshot; each non-empty category becomes one [`TokenUpdate`] published on
/// a `tokio::sync::broadcast` channel. WebSocket sessions subscribe to it.
use crate::config::BroadcastConfig;
use crate::logger::{self, LogTag};
use crate::tokens::{AggregationEngine, TokenRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    InitialData,
    PriceUpdate,
    VolumeSpike,
    NewToken,
}

/// Push message sent to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub data: Vec<TokenRecord>,
    pub timestamp: i64,
}

impl TokenUpdate {
    pub fn new(kind: UpdateKind, data: Vec<TokenRecord>) -> Self {
        Self {
            kind,
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeThresholds {
    /// Absolute price move, percent
    pub price_change_pct: f64,
    /// Volume increase, percent
    pub volume_spike_pct: f64,
}

impl From<&BroadcastConfig> for ChangeThresholds {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            price_change_pct: config.price_change_threshold_pct,
            volume_spike_pct: config.volume_spike_threshold_pct,
        }
    }
}

/// Diff `current` against `previous` (keyed by lower-cased address)
///
/// Tokens with a zero previous price or volume never trigger the matching
/// update. New tokens are only reported once a previous snapshot exists.
pub fn detect_updates(
    previous: &HashMap<String, TokenRecord>,
    current: &[TokenRecord],
    thresholds: ChangeThresholds,
) -> Vec<TokenUpdate> {
    let mut price_updates = Vec::new();
    let mut volume_spikes = Vec::new();
    let mut new_tokens = Vec::new();

    for token in current {
        let Some(before) = previous.get(&token.normalized_address()) else {
            if !previous.is_empty() {
                new_tokens.push(token.clone());
            }
            continue;
        };

        if before.price_sol > 0.0 {
            let change = ((token.price_sol - before.price_sol) / before.price_sol * 100.0).abs();
            if change > thresholds.price_change_pct {
                price_updates.push(token.clone());
            }
        }

        if before.volume_sol > 0.0 {
            let increase = (token.volume_sol - before.volume_sol) / before.volume_sol * 100.0;
            if increase > thresholds.volume_spike_pct {
                volume_spikes.push(token.clone());
            }
        }
    }

    [
        (UpdateKind::PriceUpdate, price_updates),
        (UpdateKind::VolumeSpike, volume_spikes),
        (UpdateKind::NewToken, new_tokens),
    ]
    .into_iter()
    .filter(|(_, tokens)| !tokens.is_empty())
    .map(|(kind, tokens)| TokenUpdate::new(kind, tokens))
    .collect()
}

pub struct Broadcaster {
    engine: Arc<AggregationEngine>,
    sender: broadcast::Sender<TokenUpdate>,
    thresholds: ChangeThresholds,
    snapshot: Mutex<HashMap<String, TokenRecord>>,
}

impl Broadcaster {
    pub fn new(
        engine: Arc<AggregationEngine>,
        sender: broadcast::Sender<TokenUpdate>,
        config: &BroadcastConfig,
    ) -> Self {
        Self {
            engine,
            sender,
            thresholds: ChangeThresholds::from(config),
            snapshot: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TokenUpdate> {
        self.sender.subscribe()
    }

    /// One diff-and-publish pass; returns the number of updates sent
    pub async fn tick(&self) -> usize {
        let current = self.engine.aggregate().await;
        if current.is_empty() {
            logger::debug(LogTag::Broadcast, "No tokens aggregated this tick");
            return 0;
        }

        let updates = {
            let mut snapshot = self.snapshot.lock();
            let updates = detect_updates(&snapshot, &current, self.thresholds);
            *snapshot = current
                .into_iter()
                .map(|t| (t.normalized_address(), t))
                .collect();
            updates
        };

        let mut sent = 0;
        for update in updates {
            let count = update.data.len();
            let kind = update.kind;
            // Err only means nobody is subscribed right now
            match self.sender.send(update) {
                Ok(receivers) => {
                    sent += 1;
                    logger::debug(
                        LogTag::Broadcast,
                        &format!("Broadcast {:?} ({} tokens) to {} receivers", kind, count, receivers),
                    );
                }
                Err(_) => logger::verbose(
                    LogTag::Broadcast,
                    &format!("No subscribers for {:?} ({} tokens)", kind, count),
                ),
            }
        }
        sent
    }
}
