//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the filter in front of the next stage
//! - Wire up middleware (tracing, timeout, request ID, filter)
//! - Serve over plain TCP or TLS
//! - Apply configuration reloads to the live filter
//! - Stop gracefully on the shutdown signal

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::{header::InvalidHeaderName, HeaderName},
    middleware,
    routing::any,
    Extension, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::filter::{ContextOptions, FilterEngine, TransportSecurity};
use crate::http::middleware::{filter_middleware, FilterState};
use crate::http::request::RequestIdLayer;
use crate::net::tls::load_tls_config;

/// How long TLS connections get to finish after shutdown is signalled.
const TLS_DRAIN_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid client IP header: {0}")]
    ClientIpHeader(#[from] InvalidHeaderName),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server that admits requests through the filter.
pub struct FilterServer {
    config: AppConfig,
    state: FilterState,
}

impl FilterServer {
    /// Create a new server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let client_ip_header = config
            .filter
            .client_ip_header
            .as_deref()
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .transpose()?;

        let engine = FilterEngine::new(config.filter.to_filter_config());
        let state = FilterState::new(engine, ContextOptions { client_ip_header });

        Ok(Self { config, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self, transport: TransportSecurity) -> Router {
        Router::new()
            .route("/{*path}", any(passthrough))
            .route("/", any(passthrough))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                filter_middleware,
            ))
            .layer(Extension(transport))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run over plain TCP on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        spawn_reloader(self.state.clone(), config_updates);

        let app = self
            .router(TransportSecurity::Plain)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run over TLS using the listener's certificate configuration.
    pub async fn run_tls(
        self,
        config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = self.config.listener.bind_address.parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
        })?;
        let tls = match &self.config.listener.tls {
            Some(tls) => load_tls_config(tls).await?,
            None => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "listener.tls is not configured",
                )
                .into())
            }
        };

        tracing::info!(address = %addr, tls = true, "HTTP server starting");
        serve_tls(self, addr, tls, config_updates, async move {
            let _ = shutdown.recv().await;
        })
        .await
    }
}

async fn serve_tls(
    server: FilterServer,
    addr: SocketAddr,
    tls: RustlsConfig,
    config_updates: mpsc::UnboundedReceiver<AppConfig>,
    signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    spawn_reloader(server.state.clone(), config_updates);

    let handle = axum_server::Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        signal.await;
        tracing::info!("Shutdown signal received");
        drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
    });

    let app = server
        .router(TransportSecurity::Encrypted)
        .into_make_service_with_connect_info::<SocketAddr>();

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Swap in a new filter engine for every reloaded configuration.
fn spawn_reloader(state: FilterState, mut updates: mpsc::UnboundedReceiver<AppConfig>) {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            state.swap(FilterEngine::new(config.filter.to_filter_config()));
            tracing::info!(
                ip_rules = config.filter.ip_filters.as_ref().map(Vec::len),
                user_agent_rules = config.filter.user_agent_filters.as_ref().map(Vec::len),
                "Filter configuration reloaded"
            );
        }
    });
}

/// Next stage behind the filter.
async fn passthrough() -> &'static str {
    "Passed filter"
}
