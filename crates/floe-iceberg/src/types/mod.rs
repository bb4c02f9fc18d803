//! REST request and response types.

mod config;
mod namespace;
mod sidecar;
mod table;
mod transaction;

pub use config::*;
pub use namespace::*;
pub use sidecar::*;
pub use table::*;
pub use transaction::*;

pub use floe_catalog::{NamespaceIdent, TableIdent};
