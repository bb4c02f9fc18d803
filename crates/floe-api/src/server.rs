//! HTTP server wiring.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use floe_catalog::{Catalog, FollowerCatalog, MemoryCatalog};
use floe_iceberg::{rest_router, AppState};

use crate::config::{CatalogBackend, Config, CorsConfig, CorsOrigins};
use crate::error::ServerError;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// The Floe REST catalog server.
pub struct Server {
    config: Config,
    catalog: Arc<dyn Catalog>,
    followers: Vec<Arc<dyn FollowerCatalog>>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("catalog", &self.catalog.catalog_type())
            .field(
                "followers",
                &self
                    .followers
                    .iter()
                    .map(|follower| follower.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Server {
    /// Creates a server with the catalog backend named in `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (catalog, followers) = match config.catalog_backend {
            CatalogBackend::Memory => memory_catalogs(config.followers),
        };
        Self::with_catalog(config, catalog, followers)
    }

    /// Creates a server over an existing catalog and followers.
    #[must_use]
    pub fn with_catalog(
        config: Config,
        catalog: Arc<dyn Catalog>,
        followers: Vec<Arc<dyn FollowerCatalog>>,
    ) -> Self {
        Self {
            config,
            catalog,
            followers,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the full HTTP router.
    ///
    /// # Endpoints
    ///
    /// - `GET /health` - Liveness check
    /// - `GET /metrics` - Prometheus metrics
    /// - `GET /openapi.json` and `/v1/...` - REST catalog
    pub fn router(&self) -> Router {
        let state = AppState::with_config(Arc::clone(&self.catalog), self.config.rest_config())
            .with_followers(self.followers.clone());

        let router = Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .merge(rest_router(state));

        match Self::cors_layer(&self.config.cors) {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
        let allow_origin = match &cors.origins {
            CorsOrigins::Disabled => return None,
            CorsOrigins::Any => AllowOrigin::any(),
            CorsOrigins::List(origins) => AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            ),
        };
        tracing::info!(origins = ?cors.origins, "CORS enabled");

        let request_id = HeaderName::from_static(floe_iceberg::context::REQUEST_ID_HEADER);
        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, request_id.clone()])
                .expose_headers([request_id])
                .max_age(Duration::from_secs(cors.max_age_seconds)),
        )
    }

    /// Binds the listener and serves until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn serve(&self) -> Result<(), ServerError> {
        floe_iceberg::metrics::install_recorder()?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let router = self.router();

        tracing::info!(
            addr = %addr,
            catalog = self.catalog.catalog_type(),
            followers = self.followers.len(),
            "Starting Floe REST catalog server"
        );

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

fn memory_catalogs(count: usize) -> (Arc<dyn Catalog>, Vec<Arc<dyn FollowerCatalog>>) {
    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
    let followers = (0..count)
        .map(|i| {
            Arc::new(MemoryCatalog::new().with_name(format!("replica-{i}")))
                as Arc<dyn FollowerCatalog>
        })
        .collect();
    (catalog, followers)
}

/// Health check endpoint handler.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn metrics() -> Response {
    match floe_iceberg::metrics::render() {
        Some(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
