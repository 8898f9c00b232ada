//! Shared utilities for integration testing.

use std::net::SocketAddr;

use request_filter::{AppConfig, FilterServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A gateway running on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub config_tx: mpsc::UnboundedSender<AppConfig>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway with the given configuration.
pub async fn start_gateway(config: AppConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = FilterServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, server_shutdown).await;
    });

    TestGateway {
        addr,
        config_tx,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
