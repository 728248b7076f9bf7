//! # Request/Response Logging Middleware
//!
//! One structured line when a request arrives and one when its response leaves,
//! keyed by the request ID from [`stamp_req`](super::stamp_req).
//!
//! Swap requests can take minutes while transactions confirm, so the response
//! line always carries the duration. Bodies are never logged; headers are logged
//! at `debug` with credentials redacted.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::mw_req_stamp::RequestStamp;

/// Headers whose values must never reach the logs
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
];

/// Header names and values safe to log.
fn sanitized_headers(req: &Request) -> Vec<(String, String)> {
    req.headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client_ip = ?client_ip,
        "[REQUEST] {} {}",
        method,
        path
    );
    debug!(request_id = %request_id, headers = ?sanitized_headers(&req), "[REQUEST HEADERS]");

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [SERVER ERROR]",
            method, path, status_code, duration_ms
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [CLIENT ERROR]",
            method, path, status_code, duration_ms
        );
    } else {
        info!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method, path, status_code, duration_ms
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_sanitized_headers_redact_credentials() {
        let req = Request::builder()
            .uri("/api/defi/swap")
            .header("authorization", "Bearer secret")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();

        let headers = sanitized_headers(&req);
        assert!(headers.contains(&("authorization".to_string(), "***REDACTED***".to_string())));
        assert!(headers.contains(&("content-type".to_string(), "application/json".to_string())));
    }
}
