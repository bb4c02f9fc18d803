//! The catalog capability set.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::CatalogResult;
use crate::metadata::TableMetadata;
use crate::transaction::{
    CreateTableRequest, FollowerCatalog, TransactionReceipt, TransactionRequest,
};
use crate::update::{TableRequirement, TableUpdate};

/// Hierarchical namespace identifier (e.g. `["accounting", "tax"]`).
pub type NamespaceIdent = Vec<String>;

/// String key/value properties.
pub type Properties = HashMap<String, String>;

/// Lazily produced table identifiers. Consumers stop at the first error.
pub type TableStream = BoxStream<'static, CatalogResult<TableIdent>>;

/// Table identifier: a namespace plus a table name.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub struct TableIdent {
    /// Namespace holding the table.
    pub namespace: NamespaceIdent,
    /// Table name.
    pub name: String,
}

impl TableIdent {
    /// Creates a table identifier.
    #[must_use]
    pub fn new(namespace: NamespaceIdent, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.namespace {
            write!(f, "{part}.")?;
        }
        f.write_str(&self.name)
    }
}

/// Dotted display form of a namespace, used in logs and error messages.
#[must_use]
pub fn namespace_display(namespace: &[String]) -> String {
    namespace.join(".")
}

/// A loaded table handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Identifier.
    pub ident: TableIdent,
    /// Location of the current metadata file.
    pub metadata_location: String,
    /// Current metadata.
    pub metadata: TableMetadata,
}

/// Outcome of a namespace property update.
///
/// `removed` and `missing` partition the requested removals; `updated` lists
/// every key written from the update map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesUpdateSummary {
    /// Keys written.
    pub updated: Vec<String>,
    /// Requested removals that were present.
    pub removed: Vec<String>,
    /// Requested removals that were absent.
    pub missing: Vec<String>,
}

/// Storage-owning catalog used by the REST layer.
///
/// Implementations decide how state is persisted and how commits are made
/// linearizable. A single instance is shared by every request.
#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    /// Short backend name for logs and metrics.
    fn catalog_type(&self) -> &'static str;

    /// Lists namespaces. With a parent, returns every namespace that has the
    /// parent as a strict prefix; without one, returns all namespaces.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NamespaceNotFound`](crate::CatalogError::NamespaceNotFound)
    /// if the parent neither exists nor prefixes an existing namespace.
    async fn list_namespaces(
        &self,
        parent: Option<&NamespaceIdent>,
    ) -> CatalogResult<Vec<NamespaceIdent>>;

    /// Registers a namespace. Ancestors are not implied.
    async fn create_namespace(
        &self,
        namespace: &NamespaceIdent,
        properties: Properties,
    ) -> CatalogResult<()>;

    /// Loads namespace properties.
    async fn load_namespace_properties(&self, namespace: &NamespaceIdent)
        -> CatalogResult<Properties>;

    /// Returns whether the namespace is registered.
    async fn namespace_exists(&self, namespace: &NamespaceIdent) -> CatalogResult<bool>;

    /// Drops an empty namespace.
    async fn drop_namespace(&self, namespace: &NamespaceIdent) -> CatalogResult<()>;

    /// Removes then writes namespace properties, returning the summary.
    async fn update_namespace_properties(
        &self,
        namespace: &NamespaceIdent,
        removals: &[String],
        updates: Properties,
    ) -> CatalogResult<PropertiesUpdateSummary>;

    /// Enumerates the tables in a namespace.
    async fn list_tables(&self, namespace: &NamespaceIdent) -> CatalogResult<TableStream>;

    /// Creates a table.
    async fn create_table(&self, request: CreateTableRequest) -> CatalogResult<Table>;

    /// Loads a table.
    async fn load_table(&self, ident: &TableIdent) -> CatalogResult<Table>;

    /// Checks requirements and applies updates to a previously loaded table.
    async fn commit_table(
        &self,
        table: &Table,
        requirements: &[TableRequirement],
        updates: &[TableUpdate],
    ) -> CatalogResult<Table>;

    /// Drops a table.
    async fn drop_table(&self, ident: &TableIdent) -> CatalogResult<()>;

    /// Returns whether the table is registered.
    async fn table_exists(&self, ident: &TableIdent) -> CatalogResult<bool>;

    /// Renames a table, possibly across namespaces.
    async fn rename_table(&self, from: &TableIdent, to: &TableIdent) -> CatalogResult<()>;

    /// Writes an auxiliary key/value entry.
    async fn set_sidecar(&self, key: &str, value: &str) -> CatalogResult<()>;

    /// Reads an auxiliary key/value entry.
    async fn get_sidecar(&self, key: &str) -> CatalogResult<String>;

    /// Applies every request atomically, then propagates the committed batch
    /// to followers. Follower failures do not undo the primary commit; they
    /// are reported in the receipt.
    async fn transaction(
        &self,
        requests: Vec<TransactionRequest>,
        followers: &[Arc<dyn FollowerCatalog>],
    ) -> CatalogResult<TransactionReceipt>;
}
