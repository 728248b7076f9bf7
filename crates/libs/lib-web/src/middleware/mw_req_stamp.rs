//! # Request Stamping Middleware
//!
//! Gives every request an ID, available to handlers and logging through
//! `Extension<RequestStamp>` and echoed back in the `X-Request-ID` header.
//!
//! A well-formed `X-Request-ID` sent by the caller is kept so a swap can be
//! followed across a proxy; anything else is replaced with a fresh UUID v4.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::SystemTime;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request ID that is accepted as is.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Request metadata for tracing and debugging.
#[derive(Clone, Debug)]
pub struct RequestStamp {
    /// Unique request identifier
    pub id: String,
    /// Time the request entered the server
    pub timestamp: SystemTime,
}

impl RequestStamp {
    fn from_request(req: &Request) -> Self {
        let id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| is_acceptable_id(id))
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            id,
            timestamp: SystemTime::now(),
        }
    }
}

fn is_acceptable_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Stamp the request and copy its ID onto the response.
pub async fn stamp_req(mut req: Request, next: Next) -> Response {
    let stamp = RequestStamp::from_request(&req);
    req.extensions_mut().insert(stamp.clone());

    let mut res = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&stamp.id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    res
}
