//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, pattern compilation)
//!     → AppConfig (validated, immutable)
//!     → CorrelationConfig::build_registry → CorrelationResolver
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the resolver atomically
//!     → in-flight requests keep the snapshot they started with
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Bad patterns are rejected here, never during request handling

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, CorrelationConfig, DownstreamConfig, ListenerConfig, ObservabilityConfig,
    PatternEntryConfig, TimeoutConfig,
};
