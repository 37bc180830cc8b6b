//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Background (tasks.rs):
//!     cache sweep every 60s, session sweep every 300s
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → stop accepting, drain, stop sweeps
//! ```

pub mod shutdown;
pub mod signals;
pub mod tasks;

pub use shutdown::Shutdown;
