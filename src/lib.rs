//! Content relay library: a rewriting `/proxy` endpoint with a short-lived
//! response cache, plus a session relay that pairs a viewer screen with a
//! controller over WebSocket.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod rewrite;
pub mod session;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
