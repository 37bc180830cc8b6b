//! Content fetching subsystem.
//!
//! # Data Flow
//! ```text
//! raw `url` query parameter
//!     → client.rs normalize_target (scheme default, parse, host check)
//!     → client.rs ContentFetcher::fetch (GET, ≤5 redirects, 15s timeout)
//!     → FetchedResource { status < 500, content type, bytes }
//!       or FetchError (error.rs)
//! ```

pub mod client;
pub mod error;

pub use client::{normalize_target, ContentFetcher, FetchedResource};
pub use error::FetchError;
