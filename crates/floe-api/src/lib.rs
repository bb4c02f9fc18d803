//! # floe-api
//!
//! Server composition for the Floe REST catalog.
//!
//! This crate is a thin layer over `floe-iceberg` and `floe-catalog`:
//!
//! - **Configuration**: `FLOE_*` environment variables
//! - **Backend selection**: primary catalog plus follower catalogs
//! - **Observability**: logging setup, `/metrics`, and `/health`
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health          - Health check
//! GET  /metrics         - Prometheus metrics
//! GET  /openapi.json    - Generated API document
//! /v1/...               - REST catalog
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod observability;
pub mod server;

/// Re-exports for convenient access.
pub mod prelude {
    pub use crate::config::{CatalogBackend, Config, CorsConfig, CorsOrigins};
    pub use crate::error::{ConfigError, ServerError};
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::server::Server;
}
