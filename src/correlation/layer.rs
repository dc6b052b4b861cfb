//! Tower middleware that resolves correlation headers once per request.
//!
//! Request path: resolve, store the [`CorrelationHeaders`] in the request
//! extensions, run the inner service inside a span carrying the id.
//! Response path: merge the required headers additively.

use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::correlation::headers::CorrelationHeaders;
use crate::correlation::resolver::CorrelationResolver;
use crate::observability::metrics;

/// A resolver that can be swapped while traffic is flowing.
pub type SharedResolver = Arc<ArcSwap<CorrelationResolver>>;

/// Layer that applies [`CorrelationService`].
#[derive(Clone)]
pub struct CorrelationLayer {
    resolver: SharedResolver,
}

impl CorrelationLayer {
    pub fn new(resolver: CorrelationResolver) -> Self {
        Self {
            resolver: Arc::new(ArcSwap::from_pointee(resolver)),
        }
    }

    /// Build the layer over a swappable resolver handle.
    ///
    /// Each request loads one snapshot of the resolver.
    pub fn shared(resolver: SharedResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &SharedResolver {
        &self.resolver
    }
}

impl Default for CorrelationLayer {
    fn default() -> Self {
        Self::new(CorrelationResolver::default())
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Middleware service produced by [`CorrelationLayer`].
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
    resolver: SharedResolver,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let resolution = self.resolver.load().resolve(request.headers());

        tracing::debug!(
            correlation_id = %resolution.primary_id,
            generated = resolution.generated,
            headers = resolution.headers.len(),
            "Correlation resolved"
        );
        metrics::record_resolution(resolution.generated);

        let required: CorrelationHeaders = resolution.headers.required_subset();
        let span = tracing::debug_span!("correlation", id = %resolution.primary_id);
        request.extensions_mut().insert(resolution.headers);

        let future = self.inner.call(request);
        Box::pin(
            async move {
                let mut response = future.await?;
                required.merge_into(response.headers_mut());
                Ok(response)
            }
            .instrument(span),
        )
    }
}
