//! Failure modes of an upstream fetch.

use std::time::Duration;

use axum::http::StatusCode;

/// Why a fetch did not produce a usable response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The target could not be turned into an absolute http(s) URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The upstream did not complete within the fetch timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Connection, TLS, redirect or body-level failure.
    #[error("network error ({code}): {message}")]
    Network { code: &'static str, message: String },

    /// The upstream answered with a server error.
    #[error("upstream responded with {status}")]
    Upstream { status: StatusCode },
}

impl FetchError {
    /// Upstream status, when the remote answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Upstream { status } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable error code for error pages and logs.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            FetchError::InvalidUrl { .. } => Some("ERR_INVALID_URL"),
            FetchError::Timeout(_) => Some("ETIMEDOUT"),
            FetchError::Network { code, .. } => Some(*code),
            FetchError::Upstream { .. } => None,
        }
    }

    /// Status returned to the client that requested the proxy path.
    pub fn response_status(&self) -> StatusCode {
        match self {
            FetchError::Upstream { status } => *status,
            FetchError::InvalidUrl { .. } | FetchError::Timeout(_) | FetchError::Network { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Timeout(_) => "timeout",
            FetchError::Network { .. } => "network",
            FetchError::Upstream { .. } => "upstream",
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return FetchError::Timeout(timeout);
        }
        let code = if error.is_redirect() {
            "ERR_TOO_MANY_REDIRECTS"
        } else if error.is_connect() {
            "ECONNREFUSED"
        } else if error.is_body() || error.is_decode() {
            "ERR_BAD_RESPONSE"
        } else {
            "ERR_NETWORK"
        };
        FetchError::Network {
            code,
            message: error.to_string(),
        }
    }
}
