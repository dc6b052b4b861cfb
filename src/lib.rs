//! Promiscuous correlation-id middleware.
//!
//! Picks up whatever correlation header a caller sends (`X-Correlation-Id`,
//! `X-Request-Id`, `Request-Id`, anything matching `^X-Correlation\S*`, ...),
//! settles on one primary identifier (minting a UUID when none arrives) and
//! guarantees the required headers are echoed on the response.
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use promiscuous_correlation::correlation::{Correlation, CorrelationLayer};
//!
//! async fn handler(correlation: Correlation) -> String {
//!     correlation.primary_id().unwrap_or_default().to_string()
//! }
//!
//! let app: Router = Router::new()
//!     .route("/", get(handler))
//!     .layer(CorrelationLayer::default());
//! ```

pub mod config;
pub mod correlation;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use correlation::{
    Correlation, CorrelationExt, CorrelationHeaders, CorrelationLayer, CorrelationResolver,
    PatternRegistry,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
