//! Shared helpers for route handlers.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;

use floe_catalog::TableIdent;

use crate::error::{RestError, RestResult};
use crate::ident::{parse_namespace, validate_namespace, validate_table_name};

/// Builds a response with no body.
pub(crate) fn empty_response(status: StatusCode) -> RestResult<Response> {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .map_err(|e| RestError::internal(format!("failed to build response: {e}")))
}

/// Parses the `{namespace}/tables/{table}` path pair.
pub(crate) fn parse_table_ident(namespace: &str, table: &str) -> RestResult<TableIdent> {
    let namespace = parse_namespace(namespace)?;
    validate_table_name(table)?;
    Ok(TableIdent::new(namespace, table))
}

/// Validates a table identifier supplied in a request body.
pub(crate) fn validate_table_ident(ident: &TableIdent) -> RestResult<()> {
    validate_namespace(&ident.namespace)?;
    validate_table_name(&ident.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_ident() {
        let ident = parse_table_ident("db\u{1F}raw", "events").expect("ident");
        assert_eq!(ident.to_string(), "db.raw.events");

        assert!(parse_table_ident("db", "").is_err());
        assert!(parse_table_ident("", "events").is_err());
    }

    #[test]
    fn test_empty_response_has_no_body() {
        let response = empty_response(StatusCode::NO_CONTENT).expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
