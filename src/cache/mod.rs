//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! /proxy request
//!     → normalized URL as key
//!     → ResponseCache::get (fresh entries only)
//!     → on miss: fetch + rewrite, then ResponseCache::put for 2xx/3xx
//!
//! periodic sweep task (lifecycle::tasks)
//!     → ResponseCache::sweep (drop entries past TTL)
//! ```

pub mod response_cache;

pub use response_cache::{CachedResponse, ResponseCache};

use axum::http::StatusCode;

/// Only successful and redirect responses are stored.
pub fn is_cacheable(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cacheable_statuses() {
        assert!(is_cacheable(StatusCode::OK));
        assert!(is_cacheable(StatusCode::NO_CONTENT));
        assert!(is_cacheable(StatusCode::NOT_MODIFIED));
        assert!(!is_cacheable(StatusCode::NOT_FOUND));
        assert!(!is_cacheable(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
