use crate::webserver::{models::ServiceInfo, state::AppState, utils};
use axum::{http::StatusCode, response::Response, routing::get, Router};
use std::sync::Arc;

pub mod system;
pub mod tokens;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .merge(ws::routes())
        .nest("/api", api_routes())
        .fallback(not_found)
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tokens::routes())
        .merge(system::routes())
}

/// GET /
async fn service_info() -> Response {
    utils::success_response(ServiceInfo::current())
}

async fn not_found() -> Response {
    utils::error_response(StatusCode::NOT_FOUND, "Route not found")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::apis::ApiManager;
    use crate::cache::CacheStore;
    use crate::config::Config;
    use crate::context::AppContext;
    use crate::tokens::aggregator::test_support::{StubOracle, StubSource};
    use crate::tokens::{AggregationEngine, TokenRecord, SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL};
    use crate::webserver::{build_app, AppState};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn app_with_tokens(tokens: Vec<TokenRecord>) -> Router {
        let config = Config::default();
        let apis = Arc::new(ApiManager::new(&config).unwrap());
        let cache = Arc::new(CacheStore::in_memory(30));
        let engine = Arc::new(AggregationEngine::new(
            cache.clone(),
            StubSource::ok(SOURCE_DEXSCREENER, tokens),
            StubSource::ok(SOURCE_GECKOTERMINAL, vec![]),
            StubOracle::unavailable(),
            config.aggregation.clone(),
        ));
        let context = AppContext::from_parts(config, apis, cache, engine);
        build_app(AppState::new(context))
    }

    /// Issue a request and decode the JSON body
    pub async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }
}
