//! HTTP surface of the relay.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → /proxy       → proxy.rs (fetch, rewrite, cache) → error_page.rs on failure
//!     → /, /phone/*  → pages.rs (viewer and controller documents)
//!     → /ws          → websocket.rs → relay::connection
//!     → anything else → static assets under ui.dir
//! ```

pub mod error_page;
pub mod pages;
pub mod proxy;
pub mod request;
pub mod server;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
