//! Request identification.
//!
//! `x-request-id` is set by `SetRequestIdLayer` (UUID v4) unless the client
//! sent one, and copied onto the response by `PropagateRequestIdLayer`.

use axum::http::{HeaderMap, HeaderName};

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID carried by `headers`, for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
