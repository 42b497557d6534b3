/// WebSocket push channel
///
/// On connect the client receives `initial_data` with the leading tokens of
/// the current aggregated set, then every broadcaster update as a JSON text
/// frame.
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    logger::{self, LogTag},
    services::broadcaster::{TokenUpdate, UpdateKind},
    webserver::state::AppState,
};

type WsSender = futures::stream::SplitSink<WebSocket, Message>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let active = state.increment_ws_connections();
    logger::info(
        LogTag::Websocket,
        &format!("Client connected (active_ws={})", active),
    );

    let (mut sender, mut receiver) = socket.split();
    // Subscribe first so nothing published during the initial snapshot is lost
    let mut updates = state.context.broadcaster.subscribe();

    let initial_size = state.context.config.broadcast.initial_snapshot_size;
    let mut tokens = state.context.engine.aggregate().await;
    tokens.truncate(initial_size);

    if send_update(&mut sender, &TokenUpdate::new(UpdateKind::InitialData, tokens))
        .await
        .is_ok()
    {
        loop {
            tokio::select! {
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(Message::Text(text))) => {
                            logger::debug(
                                LogTag::Websocket,
                                &format!("Ignoring client message: {}", text),
                            );
                        }
                        // Axum answers pings itself
                        Some(Ok(_)) => {}
                    }
                }

                update = updates.recv() => {
                    match update {
                        Ok(update) => {
                            if send_update(&mut sender, &update).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            logger::warning(
                                LogTag::Websocket,
                                &format!("Client lagged, {} updates skipped", skipped),
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    let active = state.decrement_ws_connections();
    logger::info(
        LogTag::Websocket,
        &format!("Client disconnected (active_ws={})", active),
    );
}

async fn send_update(sender: &mut WsSender, update: &TokenUpdate) -> Result<(), String> {
    let json = serde_json::to_string(update).map_err(|e| format!("Serialization error: {}", e))?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("Send error: {}", e))
}
