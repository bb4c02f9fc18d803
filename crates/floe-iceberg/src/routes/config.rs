//! Handler for `/v1/config` endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::RestResult;
use crate::state::AppState;
use crate::types::{ConfigQuery, ConfigResponse};

/// Creates the config route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/config", get(get_config))
}

/// Handler for `GET /v1/config`.
///
/// Returns the static server configuration. Warehouse selection is not
/// supported; a requested warehouse is ignored.
#[utoipa::path(
    get,
    path = "/v1/config",
    params(ConfigQuery),
    responses(
        (status = 200, description = "Catalog configuration", body = ConfigResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
    ),
    tag = "Configuration"
)]
pub async fn get_config(
    State(state): State<AppState>,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> RestResult<Json<ConfigResponse>> {
    let Query(query) = query?;
    if let Some(warehouse) = query.warehouse.as_deref().filter(|w| !w.is_empty()) {
        tracing::warn!(warehouse, "warehouse selection is not supported; ignoring");
    }

    Ok(Json(ConfigResponse {
        defaults: state.config.defaults.clone(),
        overrides: state.config.overrides.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};

    use floe_catalog::MemoryCatalog;

    use crate::routes::test_support::{memory_app, send};
    use crate::router::rest_router;
    use crate::state::{AppState, RestConfig};

    #[tokio::test]
    async fn test_get_config_returns_configured_maps() {
        let config = RestConfig {
            defaults: HashMap::from([("clients".to_string(), "4".to_string())]),
            overrides: HashMap::from([("warehouse".to_string(), "mem".to_string())]),
            concurrency_limit: None,
        };
        let app = rest_router(AppState::with_config(
            Arc::new(MemoryCatalog::new()),
            config,
        ));

        let (status, body) = send(&app, Method::GET, "/v1/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["defaults"]["clients"], "4");
        assert_eq!(body["overrides"]["warehouse"], "mem");
    }

    #[tokio::test]
    async fn test_warehouse_parameter_ignored() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/config?warehouse=s3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"defaults": {}, "overrides": {}}));
    }
}
