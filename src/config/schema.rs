//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the content relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (host and port).
    pub listener: ListenerConfig,

    /// Outbound fetch behavior.
    pub fetch: FetchConfig,

    /// Response cache bounds.
    pub cache: CacheConfig,

    /// Pairing session lifetime.
    pub sessions: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Client UI documents.
    pub ui: UiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port. The `PORT` environment variable takes precedence.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Outbound fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum number of redirects followed.
    pub max_redirects: usize,

    /// User-Agent presented to upstream servers.
    pub user_agent: String,

    /// Honor HTTP_PROXY / HTTPS_PROXY for outbound requests.
    pub use_system_proxy: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            use_system_proxy: false,
        }
    }
}

/// Which entry the cache drops when it is over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the entry that was inserted first, regardless of reads.
    #[default]
    InsertionOrder,
    /// Drop the entry that was read or inserted least recently.
    LeastRecentlyUsed,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,

    /// Maximum number of entries.
    pub capacity: usize,

    /// Interval of the expiry sweep in seconds.
    pub sweep_interval_secs: u64,

    /// Eviction policy applied when capacity is exceeded.
    pub eviction: EvictionPolicy,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            capacity: 200,
            sweep_interval_secs: 60,
            eviction: EvictionPolicy::InsertionOrder,
        }
    }
}

/// Pairing session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Absolute session lifetime in seconds, counted from creation.
    pub ttl_secs: u64,

    /// Interval of the expiry sweep in seconds.
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Location of the viewer and controller documents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Directory holding `tv.html`, `phone.html` and their assets.
    pub dir: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dir: "public".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
