//! `GET /proxy?url=` handler.
//!
//! # Flow
//! ```text
//! url param ─▶ normalize ─▶ cache hit? ──yes──▶ replay stored response
//!                               │no
//!                               ▼
//!                    fetch ─▶ rewrite ─▶ headers ─▶ cache (2xx/3xx) ─▶ respond
//!                      │
//!                      └─ FetchError ─▶ themed error page
//! ```

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::cache::{is_cacheable, CachedResponse};
use crate::fetch::normalize_target;
use crate::http::error_page;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rewrite;

pub static X_PROXIED_BY: HeaderName = HeaderName::from_static("x-proxied-by");
pub static X_ORIGINAL_URL: HeaderName = HeaderName::from_static("x-original-url");

const PROXIED_BY: &str = "content-relay";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

pub async fn proxy_handler(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    request_headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request_headers).to_string();

    let Some(target) = query.url.filter(|u| !u.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "URL parameter is required").into_response();
    };

    let url = match normalize_target(&target) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(request_id = %request_id, target = %target, error = %e, "Rejected proxy target");
            metrics::record_fetch_error(e.kind());
            metrics::record_proxy_request(e.response_status().as_u16(), "none", start);
            return error_page::render(&target, &e);
        }
    };
    let key = url.as_str().to_string();

    if let Some(hit) = state.cache.get(&key) {
        tracing::debug!(request_id = %request_id, url = %key, "Cache hit");
        metrics::record_proxy_request(hit.status.as_u16(), "hit", start);
        return replay(hit);
    }

    tracing::info!(request_id = %request_id, url = %key, "Proxying");
    let resource = match state.fetcher.fetch(&url).await {
        Ok(resource) => resource,
        Err(e) => {
            tracing::warn!(request_id = %request_id, url = %key, error = %e, "Proxy error");
            metrics::record_fetch_error(e.kind());
            metrics::record_proxy_request(e.response_status().as_u16(), "miss", start);
            return error_page::render(&target, &e);
        }
    };

    let content_type = resource.content_type.as_deref();
    let payload = rewrite::rewrite_body(resource.body, resource.final_url.as_str(), content_type);
    let headers = proxy_headers(content_type, url.as_str(), state.cache.ttl());

    if is_cacheable(resource.status) {
        state
            .cache
            .put(key.clone(), resource.status, headers.clone(), payload.clone());
    }

    tracing::info!(
        request_id = %request_id,
        url = %key,
        status = %resource.status,
        content_type = content_type.unwrap_or(""),
        "Proxied"
    );
    metrics::record_proxy_request(resource.status.as_u16(), "miss", start);
    build_response(resource.status, headers, payload)
}

/// Headers attached to every successful proxy response.
pub fn proxy_headers(content_type: Option<&str>, original_url: &str, max_age: Duration) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = content_type
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    if let Ok(cache_control) = HeaderValue::from_str(&format!("public, max-age={}", max_age.as_secs())) {
        headers.insert(header::CACHE_CONTROL, cache_control);
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(X_PROXIED_BY.clone(), HeaderValue::from_static(PROXIED_BY));
    if let Ok(original) = HeaderValue::from_str(original_url) {
        headers.insert(X_ORIGINAL_URL.clone(), original);
    }
    headers
}

fn replay(hit: CachedResponse) -> Response {
    build_response(hit.status, hit.headers, hit.payload)
}

fn build_response(status: StatusCode, headers: HeaderMap, payload: Bytes) -> Response {
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_headers() {
        let headers = proxy_headers(
            Some("text/html; charset=utf-8"),
            "https://x.com/",
            Duration::from_secs(300),
        );
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=300");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert_eq!(headers[&X_PROXIED_BY], "content-relay");
        assert_eq!(headers[&X_ORIGINAL_URL], "https://x.com/");
    }

    #[test]
    fn test_missing_content_type_defaults() {
        let headers = proxy_headers(None, "https://x.com/f", Duration::from_secs(300));
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    }
}
