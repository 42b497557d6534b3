use axum::{extract::State, response::Response, routing::get, Router};
use std::sync::Arc;

use crate::webserver::{
    models::{HealthResponse, WebsocketHealth},
    state::AppState,
    utils::success_response,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// GET /api/health
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let context = &state.context;
    let redis = context.cache.is_ready();

    let response = HealthResponse {
        status: if redis || !context.config.cache.redis_enabled {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        uptime_seconds: context.uptime_secs(),
        redis,
        websocket: WebsocketHealth {
            connected: state.ws_connection_count(),
        },
        providers: context.apis.provider_health(),
    };

    success_response(response)
}
