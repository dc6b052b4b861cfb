//! Correlation identifier subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → pattern.rs (ordered literal/regex header-name patterns)
//!     → resolver.rs (scan, pick primary id, fill required headers)
//!     → headers.rs (CorrelationHeaders stored in request extensions)
//!     → extract.rs (handlers read the primary id / required subset)
//!
//! Response (or downstream request)
//!     ← headers.rs merge_into (required subset, additive only)
//!     ← layer.rs (tower middleware wiring both paths)
//! ```
//!
//! # Design Decisions
//! - Registry is built before traffic and shared read-only
//! - Resolution never fails; generating an id is the fallback
//! - Merging never overwrites a header the application already set

pub mod extract;
pub mod headers;
pub mod layer;
pub mod pattern;
pub mod resolver;

pub use extract::{Correlation, CorrelationExt};
pub use headers::CorrelationHeaders;
pub use layer::{CorrelationLayer, CorrelationService, SharedResolver};
pub use pattern::{HeaderPattern, PatternError, PatternRegistry, X_CORRELATION_ID};
pub use resolver::{uuid_v4, CorrelationResolver, IdGenerator, Resolution};
