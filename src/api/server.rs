//! HTTP server implementation using axum.
//!
//! Provides the dashboard API server with CORS support, graceful shutdown,
//! and tracing middleware.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::routes::{create_router, AppState};

/// Dashboard HTTP server.
pub struct ApiServer {
    port: u16,
    enabled: bool,
    state: AppState,
    shutdown_tx: Option<watch::Sender<bool>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Creates a new API server instance.
    pub fn new(port: u16, state: AppState) -> Self {
        Self {
            port,
            enabled: false,
            state,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configure CORS for localhost dashboard development.
    fn configure_cors() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::ORIGIN,
            ])
            .max_age(Duration::from_secs(3600))
    }

    fn build_router(&self) -> Router {
        create_router(self.state.clone())
            .layer(Self::configure_cors())
            .layer(TraceLayer::new_for_http())
    }

    /// Starts the HTTP server.
    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.enabled {
            warn!("API server is already running");
            return Ok(());
        }

        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let router = self.build_router();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        let listener = TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);

        self.enabled = true;

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    while !*shutdown_rx.borrow() {
                        if shutdown_rx.changed().await.is_err() {
                            break;
                        }
                    }
                    info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    error!("API server error: {}", e);
                });
        });

        self.server_handle = Some(handle);

        Ok(())
    }

    /// Stops the HTTP server gracefully.
    pub async fn stop(&mut self) {
        if !self.enabled {
            warn!("API server is not running");
            return;
        }

        info!("Stopping API server...");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }

        if let Some(handle) = self.server_handle.take() {
            tokio::select! {
                _ = handle => {
                    info!("API server stopped successfully");
                }
                _ = tokio::time::sleep(Duration::from_secs(5)) => {
                    warn!("API server shutdown timed out");
                }
            }
        }

        self.enabled = false;
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}
