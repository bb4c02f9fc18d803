//! Error types for the server binary.

use thiserror::Error;

/// Result alias for configuration parsing.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was present but malformed.
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
}

/// Errors raised while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The Prometheus recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Address the server tried to bind.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server loop terminated with an error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
