use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Level};

use super::RequestId;

/// Request logging middleware
///
/// Logs one line when the request enters and one when the response leaves,
/// the latter at a level picked from the response status.
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        remote_addr = %remote_addr,
        "started {} {}",
        method,
        uri
    );

    let start = Instant::now();
    let response = next.run(request).await;

    log_completion(&request_id, response.status(), start.elapsed());

    response
}

/// `>= 500` is an error, `400..=499` a warning, anything else info.
pub fn level_for_status(status: StatusCode) -> Level {
    match status.as_u16() {
        500.. => Level::ERROR,
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}

fn log_completion(request_id: &str, status: StatusCode, elapsed: Duration) {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("");
    let duration_ms = elapsed.as_secs_f64() * 1000.0;
    let level = level_for_status(status);

    if level == Level::ERROR {
        error!(
            request_id = %request_id,
            status = code,
            duration_ms,
            "completed with {} {} in {:?}",
            code,
            reason,
            elapsed
        );
    } else if level == Level::WARN {
        warn!(
            request_id = %request_id,
            status = code,
            duration_ms,
            "completed with {} {} in {:?}",
            code,
            reason,
            elapsed
        );
    } else {
        info!(
            request_id = %request_id,
            status = code,
            duration_ms,
            "completed with {} {} in {:?}",
            code,
            reason,
            elapsed
        );
    }
}
