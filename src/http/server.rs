//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the echo handlers
//! - Wire up middleware (tracing, correlation, timeout)
//! - Serve on a bound listener until shutdown
//! - Swap the correlation resolver when the config reloads

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::correlation::{CorrelationLayer, CorrelationResolver, PatternError, SharedResolver};
use crate::http::downstream::{DownstreamClient, DownstreamError};
use crate::http::handlers;
use crate::observability::metrics;

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub downstream: Option<Arc<DownstreamClient>>,
}

/// HTTP server for the correlation echo service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    resolver: SharedResolver,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Pattern errors surface here, before any request is served.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let registry = config.correlation.build_registry()?;
        let resolver: SharedResolver =
            Arc::new(ArcSwap::from_pointee(CorrelationResolver::new(registry)));

        let downstream = match &config.downstream.url {
            Some(url) => Some(Arc::new(DownstreamClient::new(
                url,
                Duration::from_secs(config.downstream.timeout_secs),
            )?)),
            None => None,
        };

        let state = AppState { downstream };
        let router = Self::build_router(&config, state, resolver.clone());

        Ok(Self {
            router,
            config,
            resolver,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, resolver: SharedResolver) -> Router {
        Router::new()
            .route("/", get(handlers::echo))
            .route("/downstream", get(handlers::downstream))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(CorrelationLayer::shared(resolver))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live resolver.
    pub fn resolver(&self) -> SharedResolver {
        self.resolver.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the resolver.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let resolver = self.resolver.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_config(&resolver, &config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Rebuild the resolver from `config` and swap it in.
///
/// Returns `false` and keeps the current resolver if the patterns are invalid.
pub fn apply_config(resolver: &SharedResolver, config: &AppConfig) -> bool {
    match config.correlation.build_registry() {
        Ok(registry) => {
            let patterns = registry.len();
            resolver.store(Arc::new(CorrelationResolver::new(registry)));
            metrics::record_reload(true);
            tracing::info!(patterns, "Correlation patterns reloaded");
            true
        }
        Err(e) => {
            metrics::record_reload(false);
            tracing::error!(error = %e, "Rejected correlation patterns, keeping current set");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternEntryConfig;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let mut config = AppConfig::default();
        config.correlation.patterns.push(PatternEntryConfig {
            pattern: "^(".into(),
            required: true,
        });
        assert!(matches!(
            HttpServer::new(config),
            Err(ServerError::Pattern(_))
        ));
    }

    #[test]
    fn test_apply_config_keeps_resolver_on_error() {
        let server = HttpServer::new(AppConfig::default()).unwrap();
        let resolver = server.resolver();

        let mut bad = AppConfig::default();
        bad.correlation.patterns.push(PatternEntryConfig {
            pattern: "^(".into(),
            required: false,
        });
        assert!(!apply_config(&resolver, &bad));
        assert_eq!(resolver.load().registry().len(), 6);

        let mut good = AppConfig::default();
        good.correlation.use_default_patterns = false;
        good.correlation.patterns.push(PatternEntryConfig {
            pattern: "X-Trace-Id".into(),
            required: true,
        });
        assert!(apply_config(&resolver, &good));
        assert_eq!(resolver.load().registry().len(), 1);
    }

    #[tokio::test]
    async fn test_downstream_not_configured() {
        let server = HttpServer::new(AppConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/downstream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
        assert!(response.headers().contains_key("x-correlation-id"));
    }
}
