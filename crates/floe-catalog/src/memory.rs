//! In-memory catalog backend.
//!
//! All state lives behind one lock. Single-table commits and multi-operation
//! transactions apply to a copy of the state and swap it in only when every
//! step succeeds, so readers never observe a partial batch.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use uuid::Uuid;

use crate::catalog::{
    namespace_display, Catalog, NamespaceIdent, Properties, PropertiesUpdateSummary, Table,
    TableIdent, TableStream,
};
use crate::error::{lock_poisoned, CatalogError, CatalogResult};
use crate::metadata::{MetadataLogEntry, TableMetadata};
use crate::transaction::{
    propagate, CommitTableRequest, CreateTableRequest, FollowerCatalog, TransactionReceipt,
    TransactionRequest,
};
use crate::update::{apply_updates, check_requirements, TableRequirement, TableUpdate};

/// Default warehouse root for tables created without an explicit location.
pub const DEFAULT_WAREHOUSE: &str = "memory://warehouse";

#[derive(Debug, Clone)]
struct StoredTable {
    version: u64,
    metadata_location: String,
    metadata: TableMetadata,
}

/// How a batch operation is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApplyMode {
    /// Requirements are checked.
    Primary,
    /// The batch was already validated by the primary; only updates apply.
    Replica,
}

#[derive(Debug, Clone, Default)]
struct CatalogState {
    namespaces: BTreeMap<NamespaceIdent, Properties>,
    tables: BTreeMap<TableIdent, StoredTable>,
    sidecars: HashMap<String, String>,
}

impl CatalogState {
    fn require_namespace(&self, namespace: &NamespaceIdent) -> CatalogResult<()> {
        if self.namespaces.contains_key(namespace) {
            Ok(())
        } else {
            Err(CatalogError::NamespaceNotFound {
                namespace: namespace_display(namespace),
            })
        }
    }

    /// A namespace is known if registered or if it prefixes a registered one.
    fn namespace_known(&self, namespace: &NamespaceIdent) -> bool {
        self.namespaces.contains_key(namespace)
            || self
                .namespaces
                .keys()
                .any(|ns| is_strict_prefix(namespace, ns))
    }

    fn stored(&self, ident: &TableIdent) -> CatalogResult<&StoredTable> {
        self.tables
            .get(ident)
            .ok_or_else(|| CatalogError::TableNotFound {
                table: ident.to_string(),
            })
    }

    fn table(&self, ident: &TableIdent) -> CatalogResult<Table> {
        let stored = self.stored(ident)?;
        Ok(Table {
            ident: ident.clone(),
            metadata_location: stored.metadata_location.clone(),
            metadata: stored.metadata.clone(),
        })
    }

    fn create_table(
        &mut self,
        request: CreateTableRequest,
        warehouse: &str,
    ) -> CatalogResult<Table> {
        let CreateTableRequest {
            ident,
            schema,
            location,
            partition_spec,
            write_order,
            properties,
        } = request;

        self.require_namespace(&ident.namespace)?;
        if self.tables.contains_key(&ident) {
            return Err(CatalogError::TableAlreadyExists {
                table: ident.to_string(),
            });
        }

        let location = location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_location(warehouse, &ident));
        let metadata =
            TableMetadata::initial(location, schema, partition_spec, write_order, properties);
        let metadata_location = metadata_location(&metadata.location, 0)?;

        tracing::debug!(table = %ident, location = %metadata.location, "table created");
        self.tables.insert(
            ident.clone(),
            StoredTable {
                version: 0,
                metadata_location,
                metadata,
            },
        );
        self.table(&ident)
    }

    fn commit_table(
        &mut self,
        ident: &TableIdent,
        requirements: &[TableRequirement],
        updates: &[TableUpdate],
        mode: ApplyMode,
    ) -> CatalogResult<Table> {
        let current = self.stored(ident)?;
        if mode == ApplyMode::Primary {
            check_requirements(&current.metadata, requirements)?;
        }
        if updates.is_empty() {
            return self.table(ident);
        }

        let mut metadata = current.metadata.clone();
        apply_updates(&mut metadata, updates)?;

        let version = current.version + 1;
        metadata.metadata_log.push(MetadataLogEntry {
            metadata_file: current.metadata_location.clone(),
            timestamp_ms: current.metadata.last_updated_ms,
        });
        metadata.last_updated_ms = Utc::now().timestamp_millis();
        let next = StoredTable {
            version,
            metadata_location: metadata_location(&metadata.location, version)?,
            metadata,
        };

        self.tables.insert(ident.clone(), next);
        self.table(ident)
    }

    fn apply(
        &mut self,
        request: TransactionRequest,
        warehouse: &str,
        mode: ApplyMode,
    ) -> CatalogResult<()> {
        match request {
            TransactionRequest::CreateTable(create) => {
                self.create_table(create, warehouse)?;
            }
            TransactionRequest::CommitTable(CommitTableRequest {
                table,
                requirements,
                updates,
            }) => {
                self.commit_table(&table.ident, &requirements, &updates, mode)?;
            }
            TransactionRequest::SetSidecar { key, value } => {
                self.sidecars.insert(key, value);
            }
        }
        Ok(())
    }

    fn apply_batch(
        &mut self,
        requests: Vec<TransactionRequest>,
        warehouse: &str,
        mode: ApplyMode,
    ) -> CatalogResult<usize> {
        let count = requests.len();
        for (index, request) in requests.into_iter().enumerate() {
            let kind = request.kind();
            self.apply(request, warehouse, mode)
                .map_err(|err| err.context(format!("transaction operation {index} ({kind})")))?;
        }
        Ok(count)
    }
}

fn is_strict_prefix(prefix: &[String], candidate: &[String]) -> bool {
    candidate.len() > prefix.len() && candidate.starts_with(prefix)
}

fn default_location(warehouse: &str, ident: &TableIdent) -> String {
    let mut location = warehouse.trim_end_matches('/').to_string();
    for part in &ident.namespace {
        location.push('/');
        location.push_str(part);
    }
    location.push('/');
    location.push_str(&ident.name);
    location
}

fn metadata_location(table_location: &str, version: u64) -> CatalogResult<String> {
    let base = table_location.trim_end_matches('/');
    if base.is_empty() {
        return Err(CatalogError::backend("table location is empty"));
    }
    Ok(format!(
        "{base}/metadata/{version:05}-{}.metadata.json",
        Uuid::new_v4()
    ))
}

/// In-process catalog.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    name: String,
    warehouse: String,
    state: Arc<RwLock<CatalogState>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Creates an empty catalog rooted at [`DEFAULT_WAREHOUSE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            warehouse: DEFAULT_WAREHOUSE.to_string(),
            state: Arc::new(RwLock::new(CatalogState::default())),
        }
    }

    /// Sets the warehouse root used for default table locations.
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = warehouse.into();
        self
    }

    /// Sets the name reported when this catalog acts as a follower.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> CatalogResult<T>) -> CatalogResult<T> {
        let guard = self.state.read().map_err(|_| lock_poisoned())?;
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut CatalogState) -> CatalogResult<T>) -> CatalogResult<T> {
        let mut guard = self.state.write().map_err(|_| lock_poisoned())?;
        f(&mut guard)
    }

    /// Applies `f` to a copy of the state and keeps the copy only on success.
    fn write_atomic<T>(
        &self,
        f: impl FnOnce(&mut CatalogState) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        self.write(|state| {
            let mut draft = state.clone();
            let out = f(&mut draft)?;
            *state = draft;
            Ok(out)
        })
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    fn catalog_type(&self) -> &'static str {
        "memory"
    }

    async fn list_namespaces(
        &self,
        parent: Option<&NamespaceIdent>,
    ) -> CatalogResult<Vec<NamespaceIdent>> {
        self.read(|state| match parent {
            None => Ok(state.namespaces.keys().cloned().collect()),
            Some(parent) => {
                if !state.namespace_known(parent) {
                    return Err(CatalogError::NamespaceNotFound {
                        namespace: namespace_display(parent),
                    });
                }
                Ok(state
                    .namespaces
                    .keys()
                    .filter(|ns| is_strict_prefix(parent, ns))
                    .cloned()
                    .collect())
            }
        })
    }

    async fn create_namespace(
        &self,
        namespace: &NamespaceIdent,
        properties: Properties,
    ) -> CatalogResult<()> {
        self.write(|state| {
            if state.namespaces.contains_key(namespace) {
                return Err(CatalogError::NamespaceAlreadyExists {
                    namespace: namespace_display(namespace),
                });
            }
            state.namespaces.insert(namespace.clone(), properties);
            Ok(())
        })
    }

    async fn load_namespace_properties(
        &self,
        namespace: &NamespaceIdent,
    ) -> CatalogResult<Properties> {
        self.read(|state| {
            state
                .namespaces
                .get(namespace)
                .cloned()
                .ok_or_else(|| CatalogError::NamespaceNotFound {
                    namespace: namespace_display(namespace),
                })
        })
    }

    async fn namespace_exists(&self, namespace: &NamespaceIdent) -> CatalogResult<bool> {
        self.read(|state| Ok(state.namespaces.contains_key(namespace)))
    }

    async fn drop_namespace(&self, namespace: &NamespaceIdent) -> CatalogResult<()> {
        self.write(|state| {
            state.require_namespace(namespace)?;
            let has_tables = state.tables.keys().any(|t| &t.namespace == namespace);
            let has_children = state
                .namespaces
                .keys()
                .any(|ns| is_strict_prefix(namespace, ns));
            if has_tables || has_children {
                return Err(CatalogError::NamespaceNotEmpty {
                    namespace: namespace_display(namespace),
                });
            }
            state.namespaces.remove(namespace);
            Ok(())
        })
    }

    async fn update_namespace_properties(
        &self,
        namespace: &NamespaceIdent,
        removals: &[String],
        updates: Properties,
    ) -> CatalogResult<PropertiesUpdateSummary> {
        self.write(|state| {
            let properties = state.namespaces.get_mut(namespace).ok_or_else(|| {
                CatalogError::NamespaceNotFound {
                    namespace: namespace_display(namespace),
                }
            })?;

            let mut summary = PropertiesUpdateSummary::default();
            let mut seen = HashSet::new();
            for key in removals.iter().filter(|key| seen.insert(key.as_str())) {
                if properties.remove(key).is_some() {
                    summary.removed.push(key.clone());
                } else {
                    summary.missing.push(key.clone());
                }
            }

            let mut updated: Vec<String> = updates.keys().cloned().collect();
            updated.sort();
            properties.extend(updates);
            summary.updated = updated;
            Ok(summary)
        })
    }

    async fn list_tables(&self, namespace: &NamespaceIdent) -> CatalogResult<TableStream> {
        let idents = self.read(|state| {
            state.require_namespace(namespace)?;
            Ok(state
                .tables
                .keys()
                .filter(|t| &t.namespace == namespace)
                .cloned()
                .collect::<Vec<_>>())
        })?;
        Ok(futures::stream::iter(idents.into_iter().map(Ok)).boxed())
    }

    async fn create_table(&self, request: CreateTableRequest) -> CatalogResult<Table> {
        let warehouse = self.warehouse.clone();
        self.write(|state| state.create_table(request, &warehouse))
    }

    async fn load_table(&self, ident: &TableIdent) -> CatalogResult<Table> {
        self.read(|state| state.table(ident))
    }

    async fn commit_table(
        &self,
        table: &Table,
        requirements: &[TableRequirement],
        updates: &[TableUpdate],
    ) -> CatalogResult<Table> {
        self.write(|state| {
            state.commit_table(&table.ident, requirements, updates, ApplyMode::Primary)
        })
    }

    async fn drop_table(&self, ident: &TableIdent) -> CatalogResult<()> {
        self.write(|state| {
            state
                .tables
                .remove(ident)
                .map(|_| ())
                .ok_or_else(|| CatalogError::TableNotFound {
                    table: ident.to_string(),
                })
        })
    }

    async fn table_exists(&self, ident: &TableIdent) -> CatalogResult<bool> {
        self.read(|state| Ok(state.tables.contains_key(ident)))
    }

    async fn rename_table(&self, from: &TableIdent, to: &TableIdent) -> CatalogResult<()> {
        self.write(|state| {
            state.stored(from)?;
            state.require_namespace(&to.namespace)?;
            if from == to || state.tables.contains_key(to) {
                return Err(CatalogError::TableAlreadyExists {
                    table: to.to_string(),
                });
            }
            let stored = state
                .tables
                .remove(from)
                .ok_or_else(|| CatalogError::TableNotFound {
                    table: from.to_string(),
                })?;
            state.tables.insert(to.clone(), stored);
            Ok(())
        })
    }

    async fn set_sidecar(&self, key: &str, value: &str) -> CatalogResult<()> {
        self.write(|state| {
            state.sidecars.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn get_sidecar(&self, key: &str) -> CatalogResult<String> {
        self.read(|state| {
            state
                .sidecars
                .get(key)
                .cloned()
                .ok_or_else(|| CatalogError::SidecarNotFound {
                    key: key.to_string(),
                })
        })
    }

    async fn transaction(
        &self,
        requests: Vec<TransactionRequest>,
        followers: &[Arc<dyn FollowerCatalog>],
    ) -> CatalogResult<TransactionReceipt> {
        let warehouse = self.warehouse.clone();
        let batch = requests.clone();
        let applied = self
            .write_atomic(|state| state.apply_batch(requests, &warehouse, ApplyMode::Primary))?;

        let follower_failures = propagate(&batch, followers).await;
        Ok(TransactionReceipt {
            applied,
            follower_failures,
        })
    }
}

#[async_trait]
impl FollowerCatalog for MemoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn replicate(&self, batch: &[TransactionRequest]) -> CatalogResult<()> {
        let warehouse = self.warehouse.clone();
        self.write_atomic(|state| {
            for request in batch {
                // Replicas mirror namespaces implicitly.
                if let TransactionRequest::CreateTable(create) = request {
                    state
                        .namespaces
                        .entry(create.ident.namespace.clone())
                        .or_default();
                }
            }
            state.apply_batch(batch.to_vec(), &warehouse, ApplyMode::Replica)
        })
        .map(|_| ())
    }
}
