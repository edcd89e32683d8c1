//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router acting as the dev server host
//! - Install the proxy interceptor ahead of the host's own handlers
//! - Serve the static bundle (or 404) on pass-through
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener and shut down gracefully

use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{validate_config, ConfigError, ProxyConfig, StaticFilesConfig};
use crate::http::request::assign_request_id;
use crate::lifecycle::ShutdownSignal;
use crate::proxy::{intercept, Forwarder, ProxyState};
use crate::routing::Router as ProxyRouter;

/// HTTP server for the dev proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Validate `config` and build the server.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let state = ProxyState {
            router: Arc::new(ProxyRouter::from_config(&config.rules)?),
            forwarder: Forwarder::from_config(&config),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: ProxyState) -> Router {
        host_router(&config.static_files)
            .layer(middleware::from_fn_with_state(state, intercept))
            .layer(RequestBodyLimitLayer::new(config.limits.max_request_body_bytes))
            .layer(middleware::from_fn(assign_request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.config.rules.len(),
            static_root = ?self.config.static_files.root,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The assembled application, for driving without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Handlers that see requests no rule claimed.
fn host_router(static_files: &StaticFilesConfig) -> Router {
    match &static_files.root {
        Some(root) if static_files.spa_fallback => {
            let index = ServeFile::new(Path::new(root).join("index.html"));
            Router::new().fallback_service(ServeDir::new(root).fallback(index))
        }
        Some(root) => Router::new().fallback_service(ServeDir::new(root)),
        None => Router::new().fallback(not_found),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
