//! Shared helpers for router-level integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use futures::stream::{self, StreamExt};
use tower::ServiceExt;

use floe_catalog::{
    Catalog, CatalogError, CatalogResult, CreateTableRequest, FollowerCatalog, MemoryCatalog,
    NamespaceIdent, Properties, PropertiesUpdateSummary, Table, TableIdent, TableRequirement,
    TableStream, TableUpdate, TransactionReceipt, TransactionRequest,
};

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

pub fn table_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "schema": {
            "type": "struct",
            "schema-id": 0,
            "fields": [{"id": 1, "name": "id", "required": true, "type": "long"}]
        }
    })
}

/// How [`CountingCatalog`] enumerates tables.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Listing {
    Intact,
    FailAfterFirst,
    NamelessAfterFirst,
}

/// Wraps a [`MemoryCatalog`], counting every call and optionally corrupting
/// the table enumeration after its first element.
pub struct CountingCatalog {
    inner: MemoryCatalog,
    calls: AtomicUsize,
    listing: Listing,
}

impl CountingCatalog {
    pub fn new() -> Self {
        Self {
            inner: MemoryCatalog::new(),
            calls: AtomicUsize::new(0),
            listing: Listing::Intact,
        }
    }

    pub fn with_broken_listing() -> Self {
        Self {
            listing: Listing::FailAfterFirst,
            ..Self::new()
        }
    }

    pub fn with_nameless_listing() -> Self {
        Self {
            listing: Listing::NamelessAfterFirst,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Catalog for CountingCatalog {
    fn catalog_type(&self) -> &'static str {
        "counting"
    }

    async fn list_namespaces(
        &self,
        parent: Option<&NamespaceIdent>,
    ) -> CatalogResult<Vec<NamespaceIdent>> {
        self.tick();
        self.inner.list_namespaces(parent).await
    }

    async fn create_namespace(
        &self,
        namespace: &NamespaceIdent,
        properties: Properties,
    ) -> CatalogResult<()> {
        self.tick();
        self.inner.create_namespace(namespace, properties).await
    }

    async fn load_namespace_properties(
        &self,
        namespace: &NamespaceIdent,
    ) -> CatalogResult<Properties> {
        self.tick();
        self.inner.load_namespace_properties(namespace).await
    }

    async fn namespace_exists(&self, namespace: &NamespaceIdent) -> CatalogResult<bool> {
        self.tick();
        self.inner.namespace_exists(namespace).await
    }

    async fn drop_namespace(&self, namespace: &NamespaceIdent) -> CatalogResult<()> {
        self.tick();
        self.inner.drop_namespace(namespace).await
    }

    async fn update_namespace_properties(
        &self,
        namespace: &NamespaceIdent,
        removals: &[String],
        updates: Properties,
    ) -> CatalogResult<PropertiesUpdateSummary> {
        self.tick();
        self.inner
            .update_namespace_properties(namespace, removals, updates)
            .await
    }

    async fn list_tables(&self, namespace: &NamespaceIdent) -> CatalogResult<TableStream> {
        self.tick();
        let tables = self.inner.list_tables(namespace).await?;
        match self.listing {
            Listing::Intact => Ok(tables),
            Listing::FailAfterFirst => {
                let failure = stream::once(async {
                    Err(CatalogError::backend("object listing interrupted"))
                });
                Ok(tables.take(1).chain(failure).boxed())
            }
            Listing::NamelessAfterFirst => {
                let nameless = TableIdent::new(namespace.clone(), "");
                let tail = stream::once(async move { Ok(nameless) });
                Ok(tables.take(1).chain(tail).boxed())
            }
        }
    }

    async fn create_table(&self, request: CreateTableRequest) -> CatalogResult<Table> {
        self.tick();
        self.inner.create_table(request).await
    }

    async fn load_table(&self, ident: &TableIdent) -> CatalogResult<Table> {
        self.tick();
        self.inner.load_table(ident).await
    }

    async fn commit_table(
        &self,
        table: &Table,
        requirements: &[TableRequirement],
        updates: &[TableUpdate],
    ) -> CatalogResult<Table> {
        self.tick();
        self.inner.commit_table(table, requirements, updates).await
    }

    async fn drop_table(&self, ident: &TableIdent) -> CatalogResult<()> {
        self.tick();
        self.inner.drop_table(ident).await
    }

    async fn table_exists(&self, ident: &TableIdent) -> CatalogResult<bool> {
        self.tick();
        self.inner.table_exists(ident).await
    }

    async fn rename_table(&self, from: &TableIdent, to: &TableIdent) -> CatalogResult<()> {
        self.tick();
        self.inner.rename_table(from, to).await
    }

    async fn set_sidecar(&self, key: &str, value: &str) -> CatalogResult<()> {
        self.tick();
        self.inner.set_sidecar(key, value).await
    }

    async fn get_sidecar(&self, key: &str) -> CatalogResult<String> {
        self.tick();
        self.inner.get_sidecar(key).await
    }

    async fn transaction(
        &self,
        requests: Vec<TransactionRequest>,
        followers: &[Arc<dyn FollowerCatalog>],
    ) -> CatalogResult<TransactionReceipt> {
        self.tick();
        self.inner.transaction(requests, followers).await
    }
}

/// A follower that rejects every batch.
pub struct OfflineFollower;

#[async_trait]
impl FollowerCatalog for OfflineFollower {
    fn name(&self) -> &str {
        "offline-replica"
    }

    async fn replicate(&self, _batch: &[TransactionRequest]) -> CatalogResult<()> {
        Err(CatalogError::backend("replica unreachable"))
    }
}
