//! Handler for the `OpenAPI` document.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::RestError;
use crate::openapi::openapi_json;

/// Returns the REST catalog `OpenAPI` document as JSON.
pub async fn get_openapi_json() -> Response {
    match openapi_json() {
        Ok(doc) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], doc).into_response(),
        Err(err) => RestError::internal(format!("failed to serialize OpenAPI document: {err}"))
            .into_response(),
    }
}
