//! Wire error taxonomy and HTTP status mapping.
//!
//! Every failure leaving the REST layer is one of a fixed set of
//! [`ErrorModel`]s. Catalog errors are classified by walking their wrapped
//! chain; anything unrecognised is logged in full and surfaced as the generic
//! internal error so backend details never reach clients.

use std::error::Error as StdError;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use floe_catalog::CatalogError;

use crate::metrics::ErrorKind;

/// Result type alias for REST handlers.
pub type RestResult<T> = Result<T, RestError>;

/// Immutable description of one wire error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorModel {
    /// Fixed human-readable message.
    pub message: &'static str,
    /// Exception type name.
    pub error_type: &'static str,
    /// HTTP status code.
    pub code: StatusCode,
}

/// Taxonomy entries.
pub mod models {
    use super::{ErrorModel, StatusCode};

    /// 400: the request could not be parsed or validated.
    pub const MALFORMED_REQUEST: ErrorModel = ErrorModel {
        message: "Malformed request",
        error_type: "BadRequestException",
        code: StatusCode::BAD_REQUEST,
    };

    /// 404: namespace missing.
    pub const NAMESPACE_NOT_FOUND: ErrorModel = ErrorModel {
        message: "The given namespace does not exist",
        error_type: "NoSuchNamespaceException",
        code: StatusCode::NOT_FOUND,
    };

    /// 409: namespace already registered.
    pub const NAMESPACE_ALREADY_EXISTS: ErrorModel = ErrorModel {
        message: "The given namespace already exists",
        error_type: "AlreadyExistsException",
        code: StatusCode::CONFLICT,
    };

    /// 409: namespace still has tables or children.
    pub const NAMESPACE_NOT_EMPTY: ErrorModel = ErrorModel {
        message: "The given namespace is not empty",
        error_type: "NamespaceNotEmptyException",
        code: StatusCode::CONFLICT,
    };

    /// 404: table missing.
    pub const TABLE_NOT_FOUND: ErrorModel = ErrorModel {
        message: "The given table does not exist",
        error_type: "NoSuchTableException",
        code: StatusCode::NOT_FOUND,
    };

    /// 409: table already registered.
    pub const TABLE_ALREADY_EXISTS: ErrorModel = ErrorModel {
        message: "The given table already exists",
        error_type: "AlreadyExistsException",
        code: StatusCode::CONFLICT,
    };

    /// 422: a key appears in both removals and updates.
    pub const DUPLICATE_KEY: ErrorModel = ErrorModel {
        message: "The request cannot be processed as there is a key present multiple times",
        error_type: "UnprocessableEntityException",
        code: StatusCode::UNPROCESSABLE_ENTITY,
    };

    /// 501: recognised but unsupported operation.
    pub const NOT_IMPLEMENTED: ErrorModel = ErrorModel {
        message: "Not Implemented",
        error_type: "NotImplementedException",
        code: StatusCode::NOT_IMPLEMENTED,
    };

    /// 500: anything else.
    pub const INTERNAL_ERROR: ErrorModel = ErrorModel {
        message: "Internal Server Error",
        error_type: "InternalServerError",
        code: StatusCode::INTERNAL_SERVER_ERROR,
    };

    /// 409: a commit requirement did not hold.
    pub const COMMIT_FAILED: ErrorModel = ErrorModel {
        message: "The table has changed since it was loaded",
        error_type: "CommitFailedException",
        code: StatusCode::CONFLICT,
    };

    /// 404: sidecar key missing.
    pub const SIDECAR_NOT_FOUND: ErrorModel = ErrorModel {
        message: "The given key does not exist",
        error_type: "NoSuchKeyException",
        code: StatusCode::NOT_FOUND,
    };

    /// 500: primary committed, a follower did not.
    pub const FOLLOWER_PROPAGATION: ErrorModel = ErrorModel {
        message: "The transaction was committed but could not be propagated to all followers",
        error_type: "FollowerPropagationException",
        code: StatusCode::INTERNAL_SERVER_ERROR,
    };
}

/// Errors returned by REST handlers.
#[derive(Debug, Error)]
pub enum RestError {
    /// 400 with a client-facing detail.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Validation detail.
        message: String,
    },

    /// 404.
    #[error("namespace does not exist")]
    NamespaceNotFound,

    /// 409.
    #[error("namespace already exists")]
    NamespaceAlreadyExists,

    /// 409.
    #[error("namespace is not empty")]
    NamespaceNotEmpty,

    /// 404.
    #[error("table does not exist")]
    TableNotFound,

    /// 409.
    #[error("table already exists")]
    TableAlreadyExists,

    /// 422.
    #[error("keys present in both removals and updates: {keys:?}")]
    DuplicateKey {
        /// Overlapping keys, sorted.
        keys: Vec<String>,
    },

    /// 501.
    #[error("not implemented: {operation}")]
    NotImplemented {
        /// Rejected operation, for logs only.
        operation: &'static str,
    },

    /// 409 with the failed requirement.
    #[error("commit failed: {message}")]
    CommitFailed {
        /// Requirement detail.
        message: String,
    },

    /// 404.
    #[error("sidecar key does not exist")]
    SidecarNotFound,

    /// 500 after a committed primary.
    #[error("followers failed to apply committed batch: {followers:?}")]
    FollowerPropagation {
        /// Names of failed followers, for logs only.
        followers: Vec<String>,
    },

    /// 500. The detail is logged and never sent.
    #[error("internal error: {detail}")]
    Internal {
        /// Full failure description.
        detail: String,
    },
}

impl RestError {
    /// Creates a malformed request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// Returns the taxonomy entry for this error.
    #[must_use]
    pub const fn model(&self) -> &'static ErrorModel {
        match self {
            Self::MalformedRequest { .. } => &models::MALFORMED_REQUEST,
            Self::NamespaceNotFound => &models::NAMESPACE_NOT_FOUND,
            Self::NamespaceAlreadyExists => &models::NAMESPACE_ALREADY_EXISTS,
            Self::NamespaceNotEmpty => &models::NAMESPACE_NOT_EMPTY,
            Self::TableNotFound => &models::TABLE_NOT_FOUND,
            Self::TableAlreadyExists => &models::TABLE_ALREADY_EXISTS,
            Self::DuplicateKey { .. } => &models::DUPLICATE_KEY,
            Self::NotImplemented { .. } => &models::NOT_IMPLEMENTED,
            Self::CommitFailed { .. } => &models::COMMIT_FAILED,
            Self::SidecarNotFound => &models::SIDECAR_NOT_FOUND,
            Self::FollowerPropagation { .. } => &models::FOLLOWER_PROPAGATION,
            Self::Internal { .. } => &models::INTERNAL_ERROR,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.model().code
    }

    /// Returns the exception type string.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        self.model().error_type
    }

    /// Returns the message sent to clients.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MalformedRequest { message } | Self::CommitFailed { message } => message.clone(),
            Self::DuplicateKey { keys } => {
                format!("{}: {}", models::DUPLICATE_KEY.message, keys.join(", "))
            }
            other => other.model().message.to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Error detail.
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: String,
    /// Exception type (e.g., `NoSuchTableException`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// HTTP status code.
    pub code: u16,
}

impl From<&RestError> for ErrorResponse {
    fn from(err: &RestError) -> Self {
        Self {
            error: ErrorDetail {
                message: err.message(),
                error_type: err.error_type().to_string(),
                code: err.status_code().as_u16(),
            },
        }
    }
}

impl From<CatalogError> for RestError {
    fn from(err: CatalogError) -> Self {
        // Namespace absence dominates: a missing namespace also means the
        // table inside it is missing.
        if err.any(|e| matches!(e, CatalogError::NamespaceNotFound { .. })) {
            return Self::NamespaceNotFound;
        }
        if err.any(|e| matches!(e, CatalogError::TableNotFound { .. })) {
            return Self::TableNotFound;
        }

        let root = err.chain().last().unwrap_or(&err);
        match root {
            CatalogError::NamespaceAlreadyExists { .. } => Self::NamespaceAlreadyExists,
            CatalogError::NamespaceNotEmpty { .. } => Self::NamespaceNotEmpty,
            CatalogError::TableAlreadyExists { .. } => Self::TableAlreadyExists,
            CatalogError::SidecarNotFound { .. } => Self::SidecarNotFound,
            CatalogError::RequirementFailed { message } => Self::CommitFailed {
                message: message.clone(),
            },
            CatalogError::InvalidUpdate { message } => Self::MalformedRequest {
                message: message.clone(),
            },
            CatalogError::NamespaceNotFound { .. }
            | CatalogError::TableNotFound { .. }
            | CatalogError::Backend { .. }
            | CatalogError::Context { .. } => Self::Internal {
                detail: error_report(&err),
            },
        }
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for RestError {
    fn from(rejection: QueryRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

impl From<PathRejection> for RestError {
    fn from(rejection: PathRejection) -> Self {
        Self::malformed(rejection.body_text())
    }
}

/// Renders an error and its full source chain on one line.
#[must_use]
pub fn error_report(err: &(dyn StdError + 'static)) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        report.push_str(": ");
        report.push_str(&cause.to_string());
        source = cause.source();
    }
    report
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal { detail } => {
                tracing::error!(error = %detail, "internal error");
            }
            Self::FollowerPropagation { followers } => {
                tracing::error!(followers = ?followers, "transaction committed without full propagation");
            }
            _ => {}
        }

        let status = self.status_code();
        let body = ErrorResponse::from(&self);
        let mut response = (status, axum::Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorKind(self.error_type()));
        response
    }
}
