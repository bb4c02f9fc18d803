//! # floe-catalog
//!
//! The catalog capability set consumed by the Floe REST layer.
//!
//! This crate owns everything below the wire protocol:
//!
//! - **Catalog trait**: namespace and table lifecycle, sidecar key/value
//!   storage, and the atomic multi-operation transaction primitive
//! - **Table metadata**: schemas, partition specs, sort orders, snapshots
//! - **Commit semantics**: optimistic-concurrency requirements and the
//!   ordered application of metadata updates
//! - **Memory backend**: a complete in-process implementation used by the
//!   server in development and by the test suites
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use floe_catalog::{Catalog, MemoryCatalog};
//!
//! let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
//! catalog.create_namespace(&vec!["sales".into()], Default::default()).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod transaction;
pub mod update;

pub use catalog::{
    Catalog, NamespaceIdent, Properties, PropertiesUpdateSummary, Table, TableIdent, TableStream,
};
pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use metadata::TableMetadata;
pub use transaction::{
    CommitTableRequest, CreateTableRequest, FollowerCatalog, FollowerFailure, TransactionReceipt,
    TransactionRequest,
};
pub use update::{TableRequirement, TableUpdate};
