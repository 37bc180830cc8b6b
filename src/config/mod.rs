//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → CLI / PORT override applied in main
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so no file is required at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, EvictionPolicy, FetchConfig, ListenerConfig, ObservabilityConfig, RelayConfig,
    SessionConfig, TimeoutConfig, UiConfig,
};
