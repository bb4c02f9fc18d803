//! Sidecar key/value endpoint handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;

use crate::context::RequestContext;
use crate::error::{RestError, RestResult};
use crate::state::AppState;
use crate::types::SidecarEntry;

/// Creates sidecar routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sidecars", post(set_sidecar))
        .route("/sidecars/:key", get(get_sidecar))
}

fn validate_key(key: &str) -> RestResult<()> {
    if key.is_empty() {
        return Err(RestError::malformed("Sidecar key cannot be empty"));
    }
    Ok(())
}

/// Write a sidecar entry.
#[utoipa::path(
    post,
    path = "/v1/sidecars",
    request_body = SidecarEntry,
    responses(
        (status = 202, description = "Entry written"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Sidecars"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip))]
pub async fn set_sidecar(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    body: Result<Json<SidecarEntry>, JsonRejection>,
) -> RestResult<StatusCode> {
    let Json(entry) = body?;
    validate_key(&entry.key)?;
    state.catalog.set_sidecar(&entry.key, &entry.value).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Read a sidecar entry.
#[utoipa::path(
    get,
    path = "/v1/sidecars/{key}",
    params(("key" = String, Path, description = "Sidecar key")),
    responses(
        (status = 200, description = "Entry found", body = SidecarEntry),
        (status = 404, description = "Key not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Sidecars"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, key = tracing::field::Empty))]
pub async fn get_sidecar(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> RestResult<Json<SidecarEntry>> {
    let Path(key) = key?;
    tracing::Span::current().record("key", tracing::field::display(&key));
    validate_key(&key)?;
    let value = state.catalog.get_sidecar(&key).await?;
    Ok(Json(SidecarEntry { key, value }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{memory_app, send};

    #[tokio::test]
    async fn test_set_then_get() {
        let (_, app) = memory_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/sidecars",
            Some(json!({"key": "watermark", "value": "42"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, serde_json::Value::Null);

        let (status, body) = send(&app, Method::GET, "/v1/sidecars/watermark", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"key": "watermark", "value": "42"}));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/sidecars/absent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "NoSuchKeyException");
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let (_, app) = memory_app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/sidecars",
            Some(json!({"key": "", "value": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_undecodable_key_is_json_bad_request() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/sidecars/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "BadRequestException");
    }
}
