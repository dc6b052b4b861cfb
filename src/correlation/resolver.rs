//! Correlation identifier resolution.
//!
//! # Algorithm
//! ```text
//! for pattern in registry (in order):
//!     literal + required  → name is required, found or not
//!     for header in request (in arrival order):
//!         matches && not yet resolved → insert non-empty values
//!         regex + required            → discovered name is required
//!
//! first entry has a value? → primary id = that value
//! otherwise                → primary id = generator()
//!
//! every required name still unpopulated → primary id
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous: no I/O, no locks, never fails
//! - Ties break by registration order, then by request header order
//! - Every synthesized header gets the same primary id

use std::fmt;
use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::correlation::headers::CorrelationHeaders;
use crate::correlation::pattern::PatternRegistry;

/// Produces a brand new correlation identifier. Must not block.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Default generator: a random UUID in lowercase hyphenated form.
pub fn uuid_v4() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Outcome of resolving one request's headers.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// All correlation headers found or synthesized, with their required flags.
    pub headers: CorrelationHeaders,
    /// The identifier written into every synthesized required header.
    pub primary_id: String,
    /// `true` when no usable upstream identifier was found.
    pub generated: bool,
}

/// Resolves correlation headers against a pattern registry.
///
/// Cheap to clone; the registry and generator are shared.
#[derive(Clone)]
pub struct CorrelationResolver {
    registry: Arc<PatternRegistry>,
    generator: IdGenerator,
}

impl CorrelationResolver {
    pub fn new(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            generator: Arc::new(uuid_v4),
        }
    }

    /// Replace the identifier generator.
    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generator = Arc::new(generator);
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Resolve the correlation headers of an inbound request.
    pub fn resolve(&self, request_headers: &HeaderMap) -> Resolution {
        let mut resolved = CorrelationHeaders::new();

        for pattern in self.registry.patterns() {
            if pattern.is_required() {
                if let Some(name) = pattern.literal_name() {
                    resolved.mark_required(name.clone());
                }
            }

            for name in request_headers.keys() {
                if !pattern.matches(name) || resolved.contains(name) {
                    continue;
                }

                // Values that are not visible ASCII count as empty.
                let values = request_headers
                    .get_all(name)
                    .iter()
                    .filter_map(|v| v.to_str().ok());
                resolved.insert_if_absent(name.clone(), values);

                if pattern.is_regex() && pattern.is_required() {
                    resolved.mark_required(name.clone());
                }
            }
        }

        let (primary_id, generated) = match resolved.first_value() {
            Some(found) => (found.to_string(), false),
            None => (self.generate(), true),
        };

        for name in resolved.required_names().to_vec() {
            resolved.populate(&name, &primary_id);
        }
        resolved.prune_empty();
        resolved.set_primary(primary_id.clone());

        Resolution {
            headers: resolved,
            primary_id,
            generated,
        }
    }

    fn generate(&self) -> String {
        let id = (self.generator)();
        if id.is_empty() {
            tracing::warn!("Correlation id generator returned an empty id, using a UUID");
            return uuid_v4();
        }
        id
    }
}

impl Default for CorrelationResolver {
    fn default() -> Self {
        Self::new(PatternRegistry::with_defaults())
    }
}

impl fmt::Debug for CorrelationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
