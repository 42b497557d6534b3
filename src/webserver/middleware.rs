/// Webserver middleware
///
/// Request logging; every request is logged with status and latency.
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::logger::{self, LogTag};

pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    logger::info(
        LogTag::Webserver,
        &format!(
            "{} {} - {} - {}ms",
            method,
            path,
            response.status().as_u16(),
            started.elapsed().as_millis()
        ),
    );

    response
}
