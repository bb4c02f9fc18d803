//! Catalog-level endpoint handlers.
//!
//! - `POST /v1/tables/rename` - Rename a table
//! - `POST /v1/transactions/commit` - Commit a multi-operation batch

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::instrument;

use crate::context::RequestContext;
use crate::error::RestResult;
use crate::routes::utils::validate_table_ident;
use crate::state::AppState;
use crate::transaction::commit_transaction;
use crate::types::{CommitTransactionResponse, RenameTableRequest, TransactionDescriptor};

/// Creates catalog-level routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tables/rename", post(rename_table))
        .route("/transactions/commit", post(commit_batch))
}

/// Rename a table.
#[utoipa::path(
    post,
    path = "/v1/tables/rename",
    request_body = RenameTableRequest,
    responses(
        (status = 204, description = "Table renamed"),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Source table or destination namespace not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Destination already exists", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error", body = crate::error::ErrorResponse),
    ),
    tag = "Tables"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip))]
pub async fn rename_table(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    body: Result<Json<RenameTableRequest>, JsonRejection>,
) -> RestResult<StatusCode> {
    let Json(req) = body?;
    validate_table_ident(&req.source)?;
    validate_table_ident(&req.destination)?;

    state
        .catalog
        .rename_table(&req.source, &req.destination)
        .await?;

    tracing::info!(from = %req.source, to = %req.destination, "table renamed");
    Ok(StatusCode::NO_CONTENT)
}

/// Commit a batch of operations atomically.
///
/// Every operation is applied on the primary catalog or none is. The
/// committed batch is then forwarded to each follower.
#[utoipa::path(
    post,
    path = "/v1/transactions/commit",
    request_body = Vec<TransactionDescriptor>,
    responses(
        (status = 200, description = "Batch committed", body = CommitTransactionResponse),
        (status = 400, description = "Bad request", body = crate::error::ErrorResponse),
        (status = 404, description = "Namespace or table not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Conflict", body = crate::error::ErrorResponse),
        (status = 501, description = "Unsupported operation", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal error or incomplete propagation", body = crate::error::ErrorResponse),
    ),
    tag = "Transactions"
)]
#[instrument(skip_all, fields(request_id = %ctx.request_id, client_ip = ?ctx.client_ip))]
pub async fn commit_batch(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    body: Result<Json<Vec<TransactionDescriptor>>, JsonRejection>,
) -> RestResult<Json<CommitTransactionResponse>> {
    let Json(descriptors) = body?;
    let kinds: Vec<&'static str> = descriptors.iter().map(TransactionDescriptor::kind).collect();

    let committed = commit_transaction(&state, descriptors).await?;

    tracing::info!(committed, operations = ?kinds, "transaction committed");
    Ok(Json(CommitTransactionResponse { committed }))
}
