//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Build the upstream client from configuration
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::BffConfig;
use crate::http::handlers::{create_picture, health};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::picture::PictureService;
use crate::upstream::client::EndpointError;
use crate::upstream::{HttpUpstreamClient, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pictures: PictureService,
    pub started: Instant,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that reaches the configured upstreams over HTTP.
    pub fn new(config: BffConfig) -> Result<Self, EndpointError> {
        let client = HttpUpstreamClient::new(&config.services, &config.timeouts)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a server backed by an arbitrary upstream client.
    pub fn with_client(config: BffConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let state = AppState {
            pictures: PictureService::new(client, config.limits.max_fragment_bytes),
            started: Instant::now(),
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/createPicture", post(create_picture))
            .route("/health", get(health))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
