//! Header-name patterns and the ordered registry that holds them.
//!
//! # Responsibilities
//! - Classify patterns as literal or regex (regex patterns start with `^`)
//! - Compile regex patterns once, at registration time
//! - Preserve registration order (it is the tie-break during resolution)
//!
//! # Design Decisions
//! - Matching is case-insensitive for both kinds
//! - Invalid patterns fail at registration, never per request
//! - Re-registering a pattern string updates its flag in place

use axum::http::HeaderName;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// The canonical correlation header. Always required by default.
pub const X_CORRELATION_ID: &str = "X-Correlation-Id";
/// Picks up any ad-hoc header whose name starts with `X-Correlation`.
pub const X_CORRELATION_STAR: &str = r"^X-Correlation\S*";
/// Rails/Heroku style request id.
pub const X_REQUEST_ID: &str = "X-Request-Id";
/// Hierarchical request id from the .NET HTTP correlation protocol.
pub const REQUEST_ID: &str = "Request-Id";
/// Microsoft.Diagnostics.Correlation root id.
pub const X_MS_REQUEST_ROOT_ID: &str = "x-ms-request-root-id";
/// Microsoft.Diagnostics.Correlation request id.
pub const X_MS_REQUEST_ID: &str = "x-ms-request-id";

/// Errors raised while registering a pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid regex pattern `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("`{0}` is not a valid HTTP header name")]
    InvalidHeaderName(String),
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Lowercased header name, compared against the (already lowercase) `HeaderName`.
    Literal(HeaderName),
    Regex(Regex),
}

/// A single registered header-name pattern.
#[derive(Debug, Clone)]
pub struct HeaderPattern {
    pattern: String,
    required: bool,
    matcher: Matcher,
}

impl HeaderPattern {
    /// Compile a pattern. Strings starting with `^` are treated as regexes.
    pub fn new(pattern: impl Into<String>, required: bool) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let matcher = if pattern.starts_with('^') {
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| PatternError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                })?;
            Matcher::Regex(regex)
        } else {
            let name = HeaderName::from_bytes(pattern.as_bytes())
                .map_err(|_| PatternError::InvalidHeaderName(pattern.clone()))?;
            Matcher::Literal(name)
        };

        Ok(Self {
            pattern,
            required,
            matcher,
        })
    }

    /// The pattern string as registered.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.matcher, Matcher::Regex(_))
    }

    /// Whether matched headers must be echoed on egress.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The header name a literal pattern stands for. `None` for regexes.
    pub fn literal_name(&self) -> Option<&HeaderName> {
        match &self.matcher {
            Matcher::Literal(name) => Some(name),
            Matcher::Regex(_) => None,
        }
    }

    /// Test a request header name against this pattern.
    pub fn matches(&self, name: &HeaderName) -> bool {
        match &self.matcher {
            Matcher::Literal(expected) => expected == name,
            Matcher::Regex(regex) => regex.is_match(name.as_str()),
        }
    }
}

/// Ordered set of header patterns consulted by the resolver.
///
/// Built once at startup and then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    entries: Vec<HeaderPattern>,
}

impl PatternRegistry {
    /// An empty registry. Resolution against it still yields a primary id,
    /// but no header is ever required.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The default pattern table.
    pub fn with_defaults() -> Self {
        let defaults = [
            (X_CORRELATION_ID, true),
            (X_CORRELATION_STAR, false),
            (X_REQUEST_ID, false),
            (REQUEST_ID, false),
            (X_MS_REQUEST_ROOT_ID, false),
            (X_MS_REQUEST_ID, false),
        ];

        let entries = defaults
            .into_iter()
            .filter_map(|(pattern, required)| HeaderPattern::new(pattern, required).ok())
            .collect();
        Self { entries }
    }

    /// Register a pattern, or update the `required` flag of an existing one.
    ///
    /// Existing patterns keep their position.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        required: bool,
    ) -> Result<&mut Self, PatternError> {
        let pattern = pattern.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.pattern == pattern) {
            existing.required = required;
            return Ok(self);
        }

        self.entries.push(HeaderPattern::new(pattern, required)?);
        Ok(self)
    }

    /// Remove a pattern. Returns `true` if it was registered.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.pattern != pattern);
        self.entries.len() != before
    }

    /// Registered patterns, in registration order.
    pub fn patterns(&self) -> &[HeaderPattern] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> HeaderName {
        HeaderName::from_bytes(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_default_table_order() {
        let registry = PatternRegistry::with_defaults();
        let patterns: Vec<_> = registry
            .patterns()
            .iter()
            .map(|p| (p.pattern(), p.is_regex(), p.is_required()))
            .collect();

        assert_eq!(
            patterns,
            vec![
                ("X-Correlation-Id", false, true),
                (r"^X-Correlation\S*", true, false),
                ("X-Request-Id", false, false),
                ("Request-Id", false, false),
                ("x-ms-request-root-id", false, false),
                ("x-ms-request-id", false, false),
            ]
        );
    }

    #[test]
    fn test_literal_match_is_case_insensitive() {
        let pattern = HeaderPattern::new("X-Request-Id", false).unwrap();
        assert!(pattern.matches(&name("x-request-id")));
        assert!(pattern.matches(&name("X-REQUEST-ID")));
        assert!(!pattern.matches(&name("x-request-ids")));
    }

    #[test]
    fn test_regex_match_is_case_insensitive() {
        let pattern = HeaderPattern::new(r"^X-Correlation\S*", false).unwrap();
        assert!(pattern.is_regex());
        assert!(pattern.matches(&name("x-correlation-extra")));
        assert!(pattern.matches(&name("X-CORRELATION")));
        assert!(!pattern.matches(&name("x-request-id")));
    }

    #[test]
    fn test_register_overwrites_flag_in_place() {
        let mut registry = PatternRegistry::with_defaults();
        registry.register(X_REQUEST_ID, true).unwrap();

        assert_eq!(registry.len(), 6);
        let entry = &registry.patterns()[2];
        assert_eq!(entry.pattern(), X_REQUEST_ID);
        assert!(entry.is_required());
    }

    #[test]
    fn test_register_appends_new_pattern() {
        let mut registry = PatternRegistry::empty();
        registry
            .register("X-Trace-Id", true)
            .unwrap()
            .register(r"^X-B3-\S+", false)
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.patterns()[1].pattern(), r"^X-B3-\S+");
    }

    #[test]
    fn test_invalid_regex_fails_at_registration() {
        let mut registry = PatternRegistry::empty();
        let err = registry.register("^X-(Broken", false).unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_literal_fails_at_registration() {
        let err = HeaderPattern::new("Bad Header", true).unwrap_err();
        assert!(matches!(err, PatternError::InvalidHeaderName(_)));
    }

    #[test]
    fn test_remove() {
        let mut registry = PatternRegistry::with_defaults();
        assert!(registry.remove(X_MS_REQUEST_ID));
        assert!(!registry.remove(X_MS_REQUEST_ID));
        assert_eq!(registry.len(), 5);
    }
}
