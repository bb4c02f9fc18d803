//! REST catalog router setup.

use axum::middleware;
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::context::context_middleware;
use crate::metrics::metrics_middleware;
use crate::routes;
use crate::state::AppState;

/// Creates the REST catalog router.
///
/// # Endpoints
///
/// - `GET /openapi.json` - Generated API document
/// - `GET /v1/config` - Catalog configuration
/// - `/v1/namespaces/...` - Namespace and table resources
/// - `POST /v1/tables/rename` - Rename a table
/// - `POST /v1/transactions/commit` - Atomic multi-operation batch
/// - `/v1/sidecars/...` - Auxiliary key/value entries
pub fn rest_router(state: AppState) -> Router {
    let v1 = routes::config::routes()
        .merge(routes::namespaces::routes())
        .merge(routes::tables::routes())
        .merge(routes::catalog::routes())
        .merge(routes::sidecars::routes());

    let router = Router::new()
        .route(
            "/openapi.json",
            axum::routing::get(routes::openapi::get_openapi_json),
        )
        .nest("/v1", v1)
        .layer(middleware::from_fn(context_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    let router = match state.config.concurrency_limit {
        Some(limit) => router.layer(ConcurrencyLimitLayer::new(limit)),
        None => router,
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use floe_catalog::MemoryCatalog;
    use tower::ServiceExt;

    use crate::state::RestConfig;

    #[tokio::test]
    async fn test_request_id_echoed() {
        let app = rest_router(AppState::new(Arc::new(MemoryCatalog::new())));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/config")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
    }

    #[tokio::test]
    async fn test_request_id_generated_on_errors() {
        let app = rest_router(AppState::new(Arc::new(MemoryCatalog::new())));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/namespaces/missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_openapi_served_with_concurrency_limit() {
        let config = RestConfig {
            concurrency_limit: Some(4),
            ..RestConfig::default()
        };
        let app = rest_router(AppState::with_config(
            Arc::new(MemoryCatalog::new()),
            config,
        ));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
