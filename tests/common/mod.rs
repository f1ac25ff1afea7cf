//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc;

use routepipe::config::ServerConfig;
use routepipe::error::DispatchError;
use routepipe::handlers::HttpHandler;
use routepipe::{HttpServer, Shutdown};

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<ServerConfig>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server built by `factory` and wait until it accepts connections.
pub async fn start_server<F>(config: ServerConfig, factory: F) -> TestServer
where
    F: Fn(&ServerConfig) -> Result<HttpHandler, DispatchError> + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, factory).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        updates,
        shutdown,
    }
}

/// Client without connection pooling, so each test request is independent.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
