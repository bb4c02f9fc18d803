//! Table endpoint handlers.
//!
//! - `GET /v1/namespaces/{namespace}/tables` - List tables
//! - `POST /v1/namespaces/{namespace}/tables` - Create table
//! - `GET /v1/namespaces/{namespace}/tables/{table}` - Load table
//! - `POST /v1/namespaces/{namespace}/tables/{table}` - Commit table
//! - `DELETE /v1/namespaces/{namespace}/tables/{table}` - Drop table
//! - `HEAD /v1/namespaces/{namespace}/tables/{table}` - Check table exists

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use tracing::instrument;

use floe_catalog::TableIdent;

use crate::context::RequestContext;
use crate::error::{error_report, RestError, RestResult};
use crate::ident::parse_namespace;
use crate::metrics::{record_commit_conflict, CommitScope};
use crate::pagination::paginate;
use crate::routes::utils::{empty_response, parse_table_ident};
use crate::state::AppState;
use crate::transaction::create_request;
use crate::types::{
    CommitTableRequest, CommitTableResponse, CreateTableRequest, DropTableQuery,
    ListTablesQuery, ListTablesResponse, LoadTableResponse,
};

/// Creates table routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/namespaces/:namespace/tables",
            get(list_tables).post(create_table),
        )
        .route(
            "/namespaces/:namespace/tables/:table",
            get(load_table)
                .post(commit_table)
                .delete(drop_table)
                .head(head_table),
        )
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamespacePath {
    pub(crate) namespace: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TablePath {
    pub(crate) namespace: String,
    pub(crate) table: String,
}

/// List tables.
///
/// The catalog's enumeration is consumed until its first error; a failing
/// element fails the whole request.
#[utoipa::path(
    get,
    path = "/v1/namespaces/{namespace}/tables",
    params(
        ("namespace" = String, Path, description = "Namespace, components joined by 0x1F"),
        ListTablesQuery
    ),
    responses(
        (status = 200, description = "Tables listed", body = ListTablesResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Namespace not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn list_tables(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
    query: Result<Query<ListTablesQuery>, QueryRejection>,
) -> RestResult<Json<ListTablesResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    let Query(query) = query?;

    let mut stream = state.catalog.list_tables(&namespace).await?;
    let mut identifiers = Vec::new();
    while let Some(item) = stream.next().await {
        let ident = item.map_err(|err| {
            RestError::internal(format!("table enumeration failed: {}", error_report(&err)))
        })?;
        if ident.name.is_empty() {
            return Err(RestError::internal(format!(
                "table enumeration of {namespace:?} yielded an empty table name"
            )));
        }
        identifiers.push(ident);
    }
    identifiers.sort();

    let (page, next) = paginate(
        identifiers,
        |ident: &TableIdent| ident.name.clone(),
        query.page_token.as_deref(),
        query.page_size,
    )?;

    Ok(Json(ListTablesResponse {
        identifiers: page,
        next_page_token: next,
    }))
}

/// Create table.
#[utoipa::path(
    post,
    path = "/v1/namespaces/{namespace}/tables",
    params(("namespace" = String, Path, description = "Namespace, components joined by 0x1F")),
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Table created", body = LoadTableResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Namespace not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Table already exists", body = crate::error::ErrorResponse),
        (status = 501, description = "Staged creation not supported", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty))]
pub async fn create_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<NamespacePath>, PathRejection>,
    body: Result<Json<CreateTableRequest>, JsonRejection>,
) -> RestResult<Json<LoadTableResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    let namespace = parse_namespace(&path.namespace)?;
    let Json(req) = body?;
    let request = create_request(namespace, req)?;

    let table = state.catalog.create_table(request).await?;
    tracing::info!(table = %table.ident, location = %table.metadata_location, "table created");

    Ok(Json(LoadTableResponse::from_table(&table)?))
}

/// Load table.
#[utoipa::path(
    get,
    path = "/v1/namespaces/{namespace}/tables/{table}",
    params(
        ("namespace" = String, Path, description = "Namespace, components joined by 0x1F"),
        ("table" = String, Path, description = "Table name")
    ),
    responses(
        (status = 200, description = "Table loaded", body = LoadTableResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty, table = tracing::field::Empty))]
pub async fn load_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
) -> RestResult<Json<LoadTableResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    tracing::Span::current().record("table", tracing::field::display(&path.table));
    let ident = parse_table_ident(&path.namespace, &path.table)?;
    let table = state.catalog.load_table(&ident).await?;
    Ok(Json(LoadTableResponse::from_table(&table)?))
}

/// Commit updates to a table.
///
/// Requirements are checked against the current metadata and updates are
/// applied in submitted order; nothing is written if any requirement fails.
#[utoipa::path(
    post,
    path = "/v1/namespaces/{namespace}/tables/{table}",
    params(
        ("namespace" = String, Path, description = "Namespace, components joined by 0x1F"),
        ("table" = String, Path, description = "Table name")
    ),
    request_body = CommitTableRequest,
    responses(
        (status = 200, description = "Table committed", body = CommitTableResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Requirement failed", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty, table = tracing::field::Empty))]
pub async fn commit_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
    body: Result<Json<CommitTableRequest>, JsonRejection>,
) -> RestResult<Json<CommitTableResponse>> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    tracing::Span::current().record("table", tracing::field::display(&path.table));
    let ident = parse_table_ident(&path.namespace, &path.table)?;
    let Json(req) = body?;
    if let Some(identifier) = &req.identifier {
        if *identifier != ident {
            return Err(RestError::malformed(format!(
                "Identifier {identifier} does not match path {ident}"
            )));
        }
    }

    let table = state.catalog.load_table(&ident).await?;
    let committed = state
        .catalog
        .commit_table(&table, &req.requirements, &req.updates)
        .await
        .map_err(|err| {
            let err = RestError::from(err);
            if matches!(err, RestError::CommitFailed { .. }) {
                record_commit_conflict(CommitScope::Table);
            }
            err
        })?;

    tracing::info!(
        table = %ident,
        updates = req.updates.len(),
        location = %committed.metadata_location,
        "table committed"
    );
    Ok(Json(CommitTableResponse::from_table(&committed)?))
}

/// Drop table.
#[utoipa::path(
    delete,
    path = "/v1/namespaces/{namespace}/tables/{table}",
    params(
        ("namespace" = String, Path, description = "Namespace, components joined by 0x1F"),
        ("table" = String, Path, description = "Table name"),
        DropTableQuery
    ),
    responses(
        (status = 204, description = "Table dropped"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 501, description = "Purge not supported", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty, table = tracing::field::Empty))]
pub async fn drop_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
    query: Result<Query<DropTableQuery>, QueryRejection>,
) -> RestResult<StatusCode> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    tracing::Span::current().record("table", tracing::field::display(&path.table));
    let ident = parse_table_ident(&path.namespace, &path.table)?;
    let Query(query) = query?;
    if query.purge_requested {
        return Err(RestError::NotImplemented {
            operation: "purgeRequested",
        });
    }

    state.catalog.drop_table(&ident).await?;
    tracing::info!(table = %ident, "table dropped");
    Ok(StatusCode::NO_CONTENT)
}

/// Check table exists.
#[utoipa::path(
    head,
    path = "/v1/namespaces/{namespace}/tables/{table}",
    params(
        ("namespace" = String, Path, description = "Namespace, components joined by 0x1F"),
        ("table" = String, Path, description = "Table name")
    ),
    responses(
        (status = 204, description = "Table exists"),
        (status = 404, description = "Not found"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip, namespace = tracing::field::Empty, table = tracing::field::Empty))]
pub async fn head_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    path: Result<Path<TablePath>, PathRejection>,
) -> RestResult<Response> {
    let Path(path) = path?;
    tracing::Span::current().record("namespace", tracing::field::display(&path.namespace));
    tracing::Span::current().record("table", tracing::field::display(&path.table));
    let ident = parse_table_ident(&path.namespace, &path.table)?;
    let status = if state.catalog.table_exists(&ident).await? {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    };
    empty_response(status)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{memory_app, send, table_body};

    async fn seed(app: &axum::Router) {
        let (status, _) = send(
            app,
            Method::POST,
            "/v1/namespaces",
            Some(json!({"namespace": ["db"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_load_and_list_tables() {
        let (_, app) = memory_app();
        seed(&app).await;

        for name in ["orders", "events"] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/v1/namespaces/db/tables",
                Some(table_body(name)),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["metadata-location"].is_string());
            assert_eq!(body["metadata"]["format-version"], 2);
        }

        let (status, body) = send(&app, Method::GET, "/v1/namespaces/db/tables/events", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["current-schema-id"], 0);

        let (status, body) = send(&app, Method::GET, "/v1/namespaces/db/tables", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["identifiers"],
            json!([
                {"namespace": ["db"], "name": "events"},
                {"namespace": ["db"], "name": "orders"}
            ])
        );
        assert!(body.get("next-page-token").is_none());

        let (status, body) =
            send(&app, Method::GET, "/v1/namespaces/db/tables?pageSize=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identifiers"][0]["name"], "events");
        assert!(body["next-page-token"].is_string());
    }

    #[tokio::test]
    async fn test_create_conflicts_and_missing_namespace() {
        let (_, app) = memory_app();
        seed(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/tables",
            Some(table_body("t")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/tables",
            Some(table_body("t")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "AlreadyExistsException");

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/ghost/tables",
            Some(table_body("t")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "NoSuchNamespaceException");
    }

    #[tokio::test]
    async fn test_stage_create_not_implemented() {
        let (_, app) = memory_app();
        seed(&app).await;

        let mut body = table_body("t");
        body["stage-create"] = json!(true);
        let (status, body) =
            send(&app, Method::POST, "/v1/namespaces/db/tables", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"]["type"], "NotImplementedException");
    }

    #[tokio::test]
    async fn test_commit_applies_updates_and_checks_requirements() {
        let (_, app) = memory_app();
        seed(&app).await;
        send(&app, Method::POST, "/v1/namespaces/db/tables", Some(table_body("t"))).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/tables/t",
            Some(json!({
                "identifier": {"namespace": ["db"], "name": "t"},
                "requirements": [{"type": "assert-current-schema-id", "current-schema-id": 0}],
                "updates": [{"action": "set-properties", "updates": {"owner": "ops"}}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["properties"]["owner"], "ops");

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/tables/t",
            Some(json!({
                "requirements": [{"type": "assert-current-schema-id", "current-schema-id": 7}],
                "updates": [{"action": "set-properties", "updates": {"owner": "nobody"}}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "CommitFailedException");

        let (_, body) = send(&app, Method::GET, "/v1/namespaces/db/tables/t", None).await;
        assert_eq!(body["metadata"]["properties"]["owner"], "ops");
    }

    #[tokio::test]
    async fn test_commit_identifier_mismatch() {
        let (_, app) = memory_app();
        seed(&app).await;
        send(&app, Method::POST, "/v1/namespaces/db/tables", Some(table_body("t"))).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/namespaces/db/tables/t",
            Some(json!({"identifier": {"namespace": ["db"], "name": "other"}, "updates": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "BadRequestException");
    }

    #[tokio::test]
    async fn test_drop_and_head_table() {
        let (_, app) = memory_app();
        seed(&app).await;
        send(&app, Method::POST, "/v1/namespaces/db/tables", Some(table_body("t"))).await;

        let (status, _) = send(&app, Method::HEAD, "/v1/namespaces/db/tables/t", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/v1/namespaces/db/tables/t?purgeRequested=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"]["code"], 501);

        let (status, _) = send(&app, Method::DELETE, "/v1/namespaces/db/tables/t", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Method::HEAD, "/v1/namespaces/db/tables/t", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::Value::Null);

        let (status, body) = send(&app, Method::DELETE, "/v1/namespaces/db/tables/t", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "NoSuchTableException");
    }

    #[tokio::test]
    async fn test_undecodable_path_is_json_bad_request() {
        let (_, app) = memory_app();
        for uri in ["/v1/namespaces/%FF/tables", "/v1/namespaces/db/tables/%FF"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["type"], "BadRequestException", "{uri}");
            assert_eq!(body["error"]["code"], 400, "{uri}");
        }
    }
}
