//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! correlation layer / server
//!     → logging.rs (structured log events, span per request id)
//!     → metrics.rs (resolution and reload counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
