//! HTTP API and WebSocket push channel (axum)

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod utils;

pub use server::{build_app, start_server};
pub use state::AppState;
