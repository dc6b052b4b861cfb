//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{http::HeaderMap, routing::get, Json, Router};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use promiscuous_correlation::config::AppConfig;
use promiscuous_correlation::http::HttpServer;
use promiscuous_correlation::lifecycle::Shutdown;

/// Start a mock downstream that answers with the headers it received as JSON.
pub async fn start_header_echo_backend() -> SocketAddr {
    async fn echo_headers(headers: HeaderMap) -> Json<Value> {
        let map: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    Value::String(value.to_str().unwrap_or_default().to_string()),
                )
            })
            .collect();
        Json(Value::Object(map))
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", get(echo_headers));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A running echo server and the handles needed to drive it.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<AppConfig>,
}

/// Start the echo server on an ephemeral port.
pub async fn start_server(mut config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        shutdown,
        config_tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
