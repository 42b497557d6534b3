/// Request and response payloads of the HTTP API
pub mod requests;
pub mod responses;

pub use requests::TokenListQuery;
pub use responses::{EndpointIndex, HealthResponse, RefreshResponse, ServiceInfo, WebsocketHealth};
