/// Response envelope helpers
///
/// Every endpoint answers `{ success, data?, error?, timestamp }`.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 200 with `data`
pub fn success_response<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(ApiEnvelope {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_ms(),
        }),
    )
        .into_response()
}

/// `status` with an error message
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiEnvelope::<()> {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: now_ms(),
        }),
    )
        .into_response()
}
