//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → correlation layer (resolve, store in extensions)
//!     → handlers.rs (echo state, call downstream)
//!     → downstream.rs (outbound request stamped with required headers)
//!     → correlation layer (merge required headers into response)
//!     → Send to client
//! ```

pub mod downstream;
pub mod handlers;
pub mod server;

pub use downstream::DownstreamClient;
pub use server::{apply_config, AppState, HttpServer, ServerError};
