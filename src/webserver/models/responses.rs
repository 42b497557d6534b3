/// API response type definitions
use serde::Serialize;

use crate::apis::ApiManagerHealth;

/// `GET /` service description
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: EndpointIndex,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointIndex {
    pub tokens: String,
    pub token: String,
    pub refresh: String,
    pub health: String,
    pub metrics: String,
    pub websocket: String,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: EndpointIndex {
                tokens: "GET /api/tokens".to_string(),
                token: "GET /api/tokens/:address".to_string(),
                refresh: "POST /api/cache/refresh".to_string(),
                health: "GET /api/health".to_string(),
                metrics: "GET /api/metrics".to_string(),
                websocket: "GET /ws".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebsocketHealth {
    pub connected: usize,
}

/// `GET /api/health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    /// True while the shared cache backend is in use
    pub redis: bool,
    pub websocket: WebsocketHealth,
    pub providers: ApiManagerHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub message: String,
}
