//! Namespace endpoint handlers.
//!
//! - `GET /v1/namespaces` - List namespaces
//! - `POST /v1/namespaces` - Create namespace
//! - `GET /v1/namespaces/{namespace}` - Load namespace
//! - `HEAD /v1/namespaces/{namespace}` - Check namespace exists
//! - `DELETE /v1/namespaces/{namespace}` - Drop namespace
//! - `POST /v1/namespaces/{namespace}/properties` - Update properties

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use crate::context::RequestContext;
use crate::error::RestResult;
use crate::ident::{parse_namespace, parse_parent, validate_namespace};
use crate::pagination::paginate;
use crate::properties::ensure_disjoint;
use crate::routes::utils::empty_response;
use crate::state::AppState;
use crate::types::{
    CreateNamespaceRequest, CreateNamespaceResponse, GetNamespaceResponse, ListNamespacesQuery,
    ListNamespacesResponse, UpdateNamespacePropertiesRequest, UpdateNamespacePropertiesResponse,
};

/// Creates namespace routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces", get(list_namespaces).post(create_namespace))
        .route(
            "/namespaces/:namespace",
            get(get_namespace)
                .head(head_namespace)
                .delete(drop_namespace),
        )
        .route(
            "/namespaces/:namespace/properties",
            post(update_namespace_properties),
        )
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamespacePath {
    pub(crate) namespace: String,
}

/// List namespaces.
#[utoipa::path(
    get,
    path = "/v1/namespaces",
    params(ListNamespacesQuery),
    responses(
        (status = 200, description = "Namespaces listed", body = ListNamespacesResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Parent not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip))]
pub async fn list_namespaces(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    query: Result<Query<ListNamespacesQuery>, QueryRejection>,
) -> RestResult<Json<ListNamespacesResponse>> {
    let Query(query) = query?;
    let parent = parse_parent(query.parent.as_deref())?;

    let mut namespaces = state.catalog.list_namespaces(parent.as_ref()).await?;
    namespaces.sort();

    let (page, next) = paginate(
        namespaces,
        Clone::clone,
        query.page_token.as_deref(),
        query.page_size,
    )?;

    Ok(Json(ListNamespacesResponse {
        namespaces: page,
        next_page_token: next,
    }))
}

/// Create namespace.
#[utoipa::path(
    post,
    path = "/v1/namespaces",
    request_body = CreateNamespaceRequest,
    responses(
        (status = 200, description = "Namespace created", body = CreateNamespaceResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 409, description = "Namespace already exists", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip))]
pub async fn create_namespace(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    body: Result<Json<CreateNamespaceRequest>, JsonRejection>,
) -> RestResult<Json<CreateNamespaceResponse>> {
    let Json(req) = body?;
    validate_namespace(&req.namespace)?;

    state
        .catalog
        .create_namespace(&req.namespace, req.properties.clone())
        .await?;

    tracing::info!(namespace = ?req.namespace, "namespace created");
    Ok(Json(CreateNamespaceResponse {
        namespace: req.namespace,
        properties: req.properties,
    }))
}

/// Load namespace.
#[utoipa::path(
    get,
    path = "/v1/namespaces/{namespace}",
    params(("namespace" = String, Path, description = "Namespace, components joined by 0x1F")),
    responses(
        (status = 200, description = "Namespace found", body = GetNamespaceResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn get_namespace(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
) -> RestResult<Json<GetNamespaceResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    let properties = state.catalog.load_namespace_properties(&namespace).await?;

    Ok(Json(GetNamespaceResponse {
        namespace,
        properties,
    }))
}

/// Check namespace exists.
#[utoipa::path(
    head,
    path = "/v1/namespaces/{namespace}",
    params(("namespace" = String, Path, description = "Namespace, components joined by 0x1F")),
    responses(
        (status = 204, description = "Namespace exists"),
        (status = 404, description = "Not found"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn head_namespace(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
) -> RestResult<Response> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    let status = if state.catalog.namespace_exists(&namespace).await? {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    };
    empty_response(status)
}

/// Drop namespace.
#[utoipa::path(
    delete,
    path = "/v1/namespaces/{namespace}",
    params(("namespace" = String, Path, description = "Namespace, components joined by 0x1F")),
    responses(
        (status = 204, description = "Namespace dropped"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Namespace not empty", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn drop_namespace(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
) -> RestResult<StatusCode> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    state.catalog.drop_namespace(&namespace).await?;

    tracing::info!(namespace = ?namespace, "namespace dropped");
    Ok(StatusCode::NO_CONTENT)
}

/// Update namespace properties.
///
/// Overlapping removals and updates are rejected before the catalog is
/// touched.
#[utoipa::path(
    post,
    path = "/v1/namespaces/{namespace}/properties",
    params(("namespace" = String, Path, description = "Namespace, components joined by 0x1F")),
    request_body = UpdateNamespacePropertiesRequest,
    responses(
        (status = 200, description = "Properties updated", body = UpdateNamespacePropertiesResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Key in both removals and updates", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Namespaces"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn update_namespace_properties(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
    body: Result<Json<UpdateNamespacePropertiesRequest>, JsonRejection>,
) -> RestResult<Json<UpdateNamespacePropertiesResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    let Json(req) = body?;
    ensure_disjoint(&req.removals, &req.updates)?;

    let summary = state
        .catalog
        .update_namespace_properties(&namespace, &req.removals, req.updates)
        .await?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{memory_app, send};

    #[tokio::test]
    async fn test_create_load_and_head_namespace() {
        let (_, app) = memory_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["acct", "tax"], "properties": {"owner": "fin"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespace"], json!(["acct", "tax"]));
        assert_eq!(body["properties"]["owner"], "fin");

        let (status, body) = send(&app, Method::GET, "/v1/namespaces/acct%1Ftax", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["properties"], json!({"owner": "fin"}));

        let (status, body) = send(&app, Method::HEAD, "/v1/namespaces/acct%1Ftax", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        let (status, body) = send(&app, Method::HEAD, "/v1/namespaces/acct", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_load_missing_namespace() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/namespaces/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "NoSuchNamespaceException");
        assert_eq!(body["error"]["message"], "The given namespace does not exist");
        assert_eq!(body["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_empty_component_is_bad_request() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/namespaces/a%1F", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "BadRequestException");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["a", ""]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_with_parent_and_pages() {
        let (_, app) = memory_app();
        for ns in [json!(["a"]), json!(["a", "x"]), json!(["a", "y"]), json!(["b"])] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/v1/namespaces",
                Some(json!({"namespace": ns})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, Method::GET, "/v1/namespaces?parent=a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespaces"], json!([["a", "x"], ["a", "y"]]));
        assert_eq!(body["next-page-token"], serde_json::Value::Null);

        let (status, body) = send(&app, Method::GET, "/v1/namespaces?parent=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespaces"].as_array().map(Vec::len), Some(4));

        let (status, first) = send(&app, Method::GET, "/v1/namespaces?pageSize=3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["namespaces"], json!([["a"], ["a", "x"], ["a", "y"]]));
        let token = first["next-page-token"].as_str().expect("token").to_string();

        let uri = format!("/v1/namespaces?pageSize=3&pageToken={token}");
        let (status, second) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["namespaces"], json!([["b"]]));
        assert_eq!(second["next-page-token"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_list_unknown_parent_and_bad_token() {
        let (_, app) = memory_app();
        let (status, _) = send(&app, Method::GET, "/v1/namespaces?parent=ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, "/v1/namespaces?pageToken=not*a*token", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "BadRequestException");

        let (status, _) = send(&app, Method::GET, "/v1/namespaces?pageSize=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_properties_summary() {
        let (_, app) = memory_app();
        send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["db"], "properties": {"a": "1", "b": "2"}})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/properties",
            Some(json!({"removals": ["a", "z"], "updates": {"c": "3"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], json!(["c"]));
        assert_eq!(body["removed"], json!(["a"]));
        assert_eq!(body["missing"], json!(["z"]));
    }

    #[tokio::test]
    async fn test_update_properties_overlap_is_unprocessable() {
        let (_, app) = memory_app();
        send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["db"]})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/properties",
            Some(json!({"removals": ["k"], "updates": {"k": "v"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "UnprocessableEntityException");
        assert!(body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains('k')));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (_, app) = memory_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": "not-a-list"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_undecodable_namespace_is_json_bad_request() {
        let (_, app) = memory_app();
        let (status, body) = send(&app, Method::GET, "/v1/namespaces/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "BadRequestException");
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_repeated_removal_reported_once() {
        let (_, app) = memory_app();
        send(
            &app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["db"], "properties": {"a": "1"}})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/properties",
            Some(json!({"removals": ["a", "a"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], json!(["a"]));
        assert_eq!(body["missing"], json!([]));
        assert_eq!(body["updated"], json!([]));
    }
}
