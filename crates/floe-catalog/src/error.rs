//! Catalog error types.
//!
//! Backends report failures through [`CatalogError`]. The sentinel variants
//! identify conditions the REST layer translates to specific wire errors;
//! everything else is opaque to clients.

use std::error::Error as StdError;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by catalog implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The namespace is not registered.
    #[error("namespace does not exist: {namespace}")]
    NamespaceNotFound {
        /// Dotted namespace name.
        namespace: String,
    },

    /// The namespace is already registered.
    #[error("namespace already exists: {namespace}")]
    NamespaceAlreadyExists {
        /// Dotted namespace name.
        namespace: String,
    },

    /// The namespace still holds tables or child namespaces.
    #[error("namespace is not empty: {namespace}")]
    NamespaceNotEmpty {
        /// Dotted namespace name.
        namespace: String,
    },

    /// The table is not registered.
    #[error("table does not exist: {table}")]
    TableNotFound {
        /// Dotted table name.
        table: String,
    },

    /// A table with this identifier is already registered.
    #[error("table already exists: {table}")]
    TableAlreadyExists {
        /// Dotted table name.
        table: String,
    },

    /// No sidecar value is stored under the key.
    #[error("sidecar key does not exist: {key}")]
    SidecarNotFound {
        /// Sidecar key.
        key: String,
    },

    /// An optimistic-concurrency requirement did not hold.
    #[error("requirement failed: {message}")]
    RequirementFailed {
        /// Description of the failed assertion.
        message: String,
    },

    /// An update could not be applied to the current metadata.
    #[error("invalid update: {message}")]
    InvalidUpdate {
        /// Description of the rejected update.
        message: String,
    },

    /// Failure inside the storage backend.
    #[error("backend failure: {message}")]
    Backend {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// Adds context to an underlying catalog error.
    #[error("{context}")]
    Context {
        /// What the catalog was doing.
        context: String,
        /// The wrapped error.
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Creates a backend error without an underlying cause.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend error wrapping an underlying cause.
    #[must_use]
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps this error with additional context.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Iterates over this error and every wrapped catalog error beneath it.
    pub fn chain(&self) -> impl Iterator<Item = &CatalogError> {
        std::iter::successors(Some(self), |err| match err {
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Returns true if the error, or anything it wraps, matches the predicate.
    pub fn any(&self, predicate: impl Fn(&CatalogError) -> bool) -> bool {
        self.chain().any(predicate)
    }
}

pub(crate) fn lock_poisoned() -> CatalogError {
    CatalogError::backend("catalog state lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_walks_context() {
        let err = CatalogError::TableNotFound {
            table: "db.events".to_string(),
        }
        .context("loading table for commit")
        .context("transaction");

        assert_eq!(err.chain().count(), 3);
        assert!(err.any(|e| matches!(e, CatalogError::TableNotFound { .. })));
        assert!(!err.any(|e| matches!(e, CatalogError::NamespaceNotFound { .. })));
    }

    #[test]
    fn test_backend_source_is_exposed() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = CatalogError::backend_with_source("write failed", io);
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.to_string(), "backend failure: write failed");
    }
}
