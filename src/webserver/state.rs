/// Shared application state for the webserver
///
/// Wraps the composition root plus the WebSocket connection counter.
use crate::context::AppContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<AppContext>,

    /// Active WebSocket connection count
    pub ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get current WebSocket connection count
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn increment_ws_connections(&self) -> usize {
        self.ws_connections.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrement, saturating at zero
    pub fn decrement_ws_connections(&self) -> usize {
        let previous = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}
