//! # floe-iceberg
//!
//! Iceberg-style REST catalog protocol layer for Floe.
//!
//! This crate translates HTTP requests into calls on a
//! [`floe_catalog::Catalog`] and translates catalog outcomes back into wire
//! responses:
//!
//! - **Identifier codec**: hierarchical namespaces flattened into a single
//!   path segment joined by the ASCII unit separator (`0x1F`)
//! - **Properties reconciliation**: overlap validation and update summaries
//! - **Error taxonomy**: a fixed table of wire errors with opaque internals
//! - **Transactions**: heterogeneous mutation batches committed atomically
//!   and propagated to follower catalogs
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use floe_catalog::MemoryCatalog;
//! use floe_iceberg::{rest_router, AppState};
//!
//! let state = AppState::new(Arc::new(MemoryCatalog::new()));
//! let app = axum::Router::new().merge(rest_router(state));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod error;
pub mod ident;
pub mod metrics;
pub mod openapi;
pub mod pagination;
pub mod properties;
pub mod router;
pub mod state;
pub mod transaction;
pub mod types;

// Route handlers (exposed for OpenAPI generation)
pub mod routes;

pub use error::{ErrorModel, ErrorResponse, RestError, RestResult};
pub use openapi::{openapi, openapi_json, RestApiDoc};
pub use router::rest_router;
pub use state::{AppState, RestConfig};
