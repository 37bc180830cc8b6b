//! Outbound HTTP client for proxied resources.
//!
//! # Responsibilities
//! - Normalize the requested target into an absolute http(s) URL
//! - Issue a browser-like GET with redirect and timeout limits
//! - Classify failures into `FetchError`
//!
//! No retries: a failed fetch is reported once and rendered by the caller.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::config::FetchConfig;
use crate::fetch::error::FetchError;

/// A response body plus the metadata the rewriter needs.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// URL the body was finally served from, after redirects.
    pub final_url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Turn user input into an absolute http(s) URL.
///
/// Anything not already starting with `http://` or `https://` gets `https://` prepended.
pub fn normalize_target(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        }),
    }
}

/// Executes upstream GETs on behalf of proxy requests.
#[derive(Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ContentFetcher {
    /// Build the client from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(default_headers())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout());

        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            timeout: config.timeout(),
        })
    }

    /// Fetch `target`. Statuses below 500 are returned as responses.
    pub async fn fetch(&self, target: &Url) -> Result<FetchedResource, FetchError> {
        let origin = target.origin().ascii_serialization();

        let mut request = self.client.get(target.clone());
        if let Ok(value) = HeaderValue::from_str(&origin) {
            request = request
                .header(header::ORIGIN, value.clone())
                .header(header::REFERER, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!(url = %target, status = %status, "Upstream server error");
            return Err(FetchError::Upstream { status });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        tracing::debug!(
            url = %target,
            final_url = %final_url,
            status = %status,
            bytes = body.len(),
            "Fetched upstream resource"
        );

        Ok(FetchedResource {
            final_url,
            status,
            content_type,
            body,
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        let url = normalize_target("example.com/path?q=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/path?q=1");
    }

    #[test]
    fn test_normalize_keeps_scheme() {
        assert_eq!(
            normalize_target("http://example.com").unwrap().as_str(),
            "http://example.com/"
        );
        assert_eq!(
            normalize_target("HTTPS://Example.com/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_target("  https://example.com/b  ").unwrap().as_str(),
            "https://example.com/b"
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(
            normalize_target("http://"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            normalize_target("exa mple.com"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let fetcher = ContentFetcher::new(&FetchConfig::default()).unwrap();
        let target = Url::parse("http://127.0.0.1:1/").unwrap();
        let err = fetcher.fetch(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert_eq!(err.response_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
