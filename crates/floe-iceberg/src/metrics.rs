//! Catalog metrics.
//!
//! Requests are labelled by matched route and by the wire error type the
//! handler answered with, so counters line up with the error bodies clients
//! see. Commit conflicts are split by where the failed requirement was
//! detected, and every committed batch records its operation count.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Requests served, by route, method and outcome.
pub const REQUESTS: &str = "floe_request_total";

/// Request latency in seconds, by route and method.
pub const REQUEST_DURATION: &str = "floe_request_duration_seconds";

/// Error responses, by route and wire error type.
pub const REQUEST_ERRORS: &str = "floe_request_error_total";

/// Commits rejected by a failed requirement, by scope.
pub const COMMIT_CONFLICTS: &str = "floe_commit_conflict_total";

/// Followers that did not apply a committed batch, by follower name.
pub const FOLLOWER_FAILURES: &str = "floe_follower_failure_total";

/// Operations per committed transaction batch.
pub const BATCH_OPERATIONS: &str = "floe_transaction_operations";

const OK: &str = "ok";
const UNCLASSIFIED: &str = "unclassified";
const UNMATCHED_ROUTE: &str = "unmatched";

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();
static DESCRIBED: OnceLock<()> = OnceLock::new();

/// Where a failed commit requirement was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitScope {
    /// `POST /v1/namespaces/{namespace}/tables/{table}`.
    Table,
    /// `POST /v1/transactions/commit`.
    Batch,
}

impl CommitScope {
    /// Label value for this scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Batch => "batch",
        }
    }
}

/// Wire error type carried on error responses for the metrics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

fn describe() {
    DESCRIBED.get_or_init(|| {
        describe_counter!(REQUESTS, "REST requests served");
        describe_histogram!(REQUEST_DURATION, "REST request latency in seconds");
        describe_counter!(REQUEST_ERRORS, "REST error responses by wire error type");
        describe_counter!(COMMIT_CONFLICTS, "Commits rejected by a failed requirement");
        describe_counter!(
            FOLLOWER_FAILURES,
            "Followers that did not apply a committed batch"
        );
        describe_histogram!(BATCH_OPERATIONS, "Operations per committed transaction batch");
    });
}

/// Installs the process-wide Prometheus recorder.
///
/// Later calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if another recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = RECORDER.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    tracing::info!("prometheus recorder installed");
    Ok(RECORDER.get_or_init(|| handle).clone())
}

/// Renders the Prometheus exposition text, if a recorder is installed.
#[must_use]
pub fn render() -> Option<String> {
    RECORDER.get().map(PrometheusHandle::render)
}

fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |p| p.as_str().to_string())
}

fn outcome(response: &Response) -> &'static str {
    match response.extensions().get::<ErrorKind>() {
        Some(ErrorKind(kind)) => *kind,
        None if response.status().is_success() => OK,
        None => UNCLASSIFIED,
    }
}

/// Middleware that counts and times every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let route = route_label(&request);
    let method = request.method().as_str().to_string();

    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();
    let result = outcome(&response);

    counter!(
        REQUESTS,
        "route" => route.clone(),
        "method" => method.clone(),
        "outcome" => result
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "route" => route.clone(), "method" => method).record(elapsed);
    if result != OK {
        counter!(REQUEST_ERRORS, "route" => route, "error_type" => result).increment(1);
    }

    response
}

/// Records a commit rejected by a failed requirement.
pub fn record_commit_conflict(scope: CommitScope) {
    describe();
    counter!(COMMIT_CONFLICTS, "scope" => scope.as_str()).increment(1);
}

/// Records a follower that did not apply a committed batch.
pub fn record_follower_failure(follower: &str) {
    describe();
    counter!(FOLLOWER_FAILURES, "follower" => follower.to_string()).increment(1);
}

/// Records the size of a committed batch.
#[allow(clippy::cast_precision_loss)]
pub fn record_batch(operations: usize) {
    describe();
    histogram!(BATCH_OPERATIONS).record(operations as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use crate::error::RestError;

    #[test]
    fn test_commit_scope_labels() {
        assert_eq!(CommitScope::Table.as_str(), "table");
        assert_eq!(CommitScope::Batch.as_str(), "batch");
    }

    #[test]
    fn test_outcome_uses_wire_error_type() {
        let response = RestError::NamespaceNotEmpty.into_response();
        assert_eq!(outcome(&response), "NamespaceNotEmptyException");

        let response = StatusCode::NO_CONTENT.into_response();
        assert_eq!(outcome(&response), OK);

        let response = StatusCode::METHOD_NOT_ALLOWED.into_response();
        assert_eq!(outcome(&response), UNCLASSIFIED);
    }

    #[test]
    fn test_unrouted_request_label() {
        let request = Request::builder()
            .uri("/v1/namespaces/a%1Fb")
            .body(Body::empty())
            .expect("request");
        assert_eq!(route_label(&request), UNMATCHED_ROUTE);
    }
}
