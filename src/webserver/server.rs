/// Axum webserver implementation
///
/// Server lifecycle: bind, serve, graceful shutdown on the shared signal.
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::{
    context::AppContext,
    logger::{self, LogTag},
    webserver::{middleware, routes, state::AppState},
};

/// Bind the configured address
///
/// Split from [`serve`] so bind errors surface before the task is spawned.
pub async fn bind(context: &AppContext) -> Result<TcpListener, String> {
    let server = &context.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use. Stop the other instance or pass --port",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied. Use a port above 1024",
            addr
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })
}

/// Serve until `shutdown` fires
pub async fn serve(
    listener: TcpListener,
    context: Arc<AppContext>,
    shutdown: Arc<Notify>,
) -> Result<(), String> {
    let app = build_app(AppState::new(context));

    if let Ok(addr) = listener.local_addr() {
        logger::info(
            LogTag::Webserver,
            &format!("Listening on http://{} (WebSocket at ws://{}/ws)", addr, addr),
        );
    }

    let shutdown_signal = async move {
        shutdown.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Bind and serve; blocks until shut down
pub async fn start_server(context: Arc<AppContext>, shutdown: Arc<Notify>) -> Result<(), String> {
    let listener = bind(&context).await?;
    serve(listener, context, shutdown).await
}

/// Build the Axum application with all routes and middleware
pub fn build_app(state: AppState) -> Router {
    routes::create_router(Arc::new(state))
        .layer(axum::middleware::from_fn(middleware::request_logger))
        .layer(CorsLayer::permissive())
}
