//! Request-scoped access to resolved correlation headers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Extensions, Request};

use crate::correlation::headers::CorrelationHeaders;

/// Read the correlation state attached by [`CorrelationLayer`](super::CorrelationLayer).
///
/// All accessors return an absent or empty result when no resolution ran
/// for the request. That means "no correlation context", not an error.
pub trait CorrelationExt {
    /// The full resolved set.
    fn correlation_headers(&self) -> Option<&CorrelationHeaders>;

    /// The primary correlation identifier.
    fn primary_correlation_id(&self) -> Option<&str> {
        self.correlation_headers().and_then(CorrelationHeaders::primary_id)
    }

    /// Headers to stamp on responses and downstream requests.
    fn required_correlation_headers(&self) -> CorrelationHeaders {
        self.correlation_headers()
            .map(CorrelationHeaders::required_subset)
            .unwrap_or_default()
    }
}

impl CorrelationExt for Extensions {
    fn correlation_headers(&self) -> Option<&CorrelationHeaders> {
        self.get::<CorrelationHeaders>()
    }
}

impl<B> CorrelationExt for Request<B> {
    fn correlation_headers(&self) -> Option<&CorrelationHeaders> {
        self.extensions().correlation_headers()
    }
}

impl CorrelationExt for Parts {
    fn correlation_headers(&self) -> Option<&CorrelationHeaders> {
        self.extensions.correlation_headers()
    }
}

/// Axum extractor for the resolved correlation headers.
///
/// Never rejects. Without the middleware it yields an empty set.
#[derive(Debug, Clone, Default)]
pub struct Correlation(pub CorrelationHeaders);

impl Correlation {
    pub fn primary_id(&self) -> Option<&str> {
        self.0.primary_id()
    }

    pub fn required_headers(&self) -> CorrelationHeaders {
        self.0.required_subset()
    }
}

impl<S> FromRequestParts<S> for Correlation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.correlation_headers().cloned().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderName;

    #[test]
    fn test_absent_without_resolution() {
        let request = Request::new(Body::empty());
        assert!(request.correlation_headers().is_none());
        assert_eq!(request.primary_correlation_id(), None);
        assert!(request.required_correlation_headers().is_empty());
    }

    #[test]
    fn test_reads_from_extensions() {
        let mut set = CorrelationHeaders::new();
        set.insert_if_absent(HeaderName::from_static("x-correlation-id"), ["abc"]);
        set.insert_if_absent(HeaderName::from_static("request-id"), ["r"]);
        set.mark_required(HeaderName::from_static("x-correlation-id"));

        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(set);

        assert_eq!(request.primary_correlation_id(), Some("abc"));
        let required = request.required_correlation_headers();
        assert_eq!(required.len(), 1);
        // Repeated reads see the same state.
        assert_eq!(request.required_correlation_headers(), required);
    }

    #[tokio::test]
    async fn test_extractor_defaults_to_empty() {
        let (mut parts, _) = Request::new(Body::empty()).into_parts();
        let Correlation(headers) = Correlation::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(headers.is_empty());
    }
}
