use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    logger::{self, LogTag},
    webserver::{
        models::{RefreshResponse, TokenListQuery},
        state::AppState,
        utils::{error_response, success_response},
    },
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens", get(list_tokens))
        .route("/tokens/:address", get(get_token))
        .route("/cache/refresh", post(refresh_cache))
        .route("/metrics", get(get_metrics))
}

/// GET /api/tokens
async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenListQuery>,
) -> Response {
    let started = Instant::now();
    let engine = &state.context.engine;

    let tokens = engine.aggregate().await;
    let filtered = engine.filter_and_sort(&tokens, &query.filters());
    let page = engine.paginate(filtered, &query.pagination());

    let elapsed_ms = started.elapsed().as_millis();
    logger::info(
        LogTag::Webserver,
        &format!(
            "GET /api/tokens - {} of {} tokens returned in {}ms",
            page.tokens.len(),
            page.total,
            elapsed_ms
        ),
    );

    let mut response = success_response(page);
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", elapsed_ms)) {
        response.headers_mut().insert("X-Response-Time", value);
    }
    response
}

/// GET /api/tokens/:address
async fn get_token(State(state): State<Arc<AppState>>, Path(address): Path<String>) -> Response {
    if address.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Token address is required");
    }

    match state.context.engine.find_token(&address).await {
        Some(token) => success_response(token),
        None => {
            logger::debug(LogTag::Webserver, &format!("Token not found: {}", address));
            error_response(StatusCode::NOT_FOUND, "Token not found")
        }
    }
}

/// POST /api/cache/refresh
async fn refresh_cache(State(state): State<Arc<AppState>>) -> Response {
    state.context.engine.invalidate_cache().await;
    logger::info(LogTag::Webserver, "Cache manually refreshed");
    success_response(RefreshResponse {
        message: "Cache refreshed successfully".to_string(),
    })
}

/// GET /api/metrics
async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    success_response(state.context.engine.metrics().await)
}
