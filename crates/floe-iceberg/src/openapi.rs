//! `OpenAPI` (3.1) document generation for the REST catalog.

use utoipa::OpenApi;

/// `OpenAPI` documentation for the REST catalog API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Floe REST Catalog API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Iceberg-style REST catalog with atomic multi-operation transactions and follower propagation."
    ),
    paths(
        crate::routes::config::get_config,
        crate::routes::namespaces::list_namespaces,
        crate::routes::namespaces::create_namespace,
        crate::routes::namespaces::get_namespace,
        crate::routes::namespaces::head_namespace,
        crate::routes::namespaces::drop_namespace,
        crate::routes::namespaces::update_namespace_properties,
        crate::routes::tables::list_tables,
        crate::routes::tables::create_table,
        crate::routes::tables::load_table,
        crate::routes::tables::commit_table,
        crate::routes::tables::drop_table,
        crate::routes::tables::head_table,
        crate::routes::catalog::rename_table,
        crate::routes::catalog::commit_batch,
        crate::routes::sidecars::set_sidecar,
        crate::routes::sidecars::get_sidecar,
    ),
    components(
        schemas(
            crate::types::ConfigResponse,
            crate::types::ListNamespacesResponse,
            crate::types::CreateNamespaceRequest,
            crate::types::CreateNamespaceResponse,
            crate::types::GetNamespaceResponse,
            crate::types::UpdateNamespacePropertiesRequest,
            crate::types::UpdateNamespacePropertiesResponse,
            crate::types::ListTablesResponse,
            crate::types::CreateTableRequest,
            crate::types::LoadTableResponse,
            crate::types::CommitTableRequest,
            crate::types::CommitTableResponse,
            crate::types::RenameTableRequest,
            crate::types::TransactionDescriptor,
            crate::types::CreateTableDescriptor,
            crate::types::UpdateTableDescriptor,
            crate::types::CommitTransactionResponse,
            crate::types::SidecarEntry,
            crate::types::TableIdent,
            floe_catalog::TableMetadata,
            floe_catalog::TableRequirement,
            floe_catalog::TableUpdate,
            floe_catalog::metadata::Schema,
            floe_catalog::metadata::SchemaField,
            floe_catalog::metadata::PartitionSpec,
            floe_catalog::metadata::PartitionField,
            floe_catalog::metadata::SortOrder,
            floe_catalog::metadata::SortField,
            floe_catalog::metadata::Snapshot,
            floe_catalog::metadata::SnapshotLogEntry,
            floe_catalog::metadata::MetadataLogEntry,
            floe_catalog::metadata::SnapshotReference,
            crate::error::ErrorResponse,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "Configuration", description = "Catalog configuration endpoint"),
        (name = "Namespaces", description = "Namespace management operations"),
        (name = "Tables", description = "Table management and commit operations"),
        (name = "Transactions", description = "Atomic multi-operation batches"),
        (name = "Sidecars", description = "Auxiliary key/value entries"),
    ),
)]
pub struct RestApiDoc;

/// Returns the generated `OpenAPI` document.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    RestApiDoc::openapi()
}

/// Returns the generated `OpenAPI` document serialized as pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = openapi();
        assert_eq!(doc.info.title, "Floe REST Catalog API");
        for path in [
            "/v1/config",
            "/v1/namespaces",
            "/v1/namespaces/{namespace}",
            "/v1/namespaces/{namespace}/properties",
            "/v1/namespaces/{namespace}/tables/{table}",
            "/v1/tables/rename",
            "/v1/transactions/commit",
            "/v1/sidecars/{key}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = openapi_json().expect("serialization should succeed");
        assert!(json.contains("Floe REST Catalog API"));
        assert!(json.contains("/v1/transactions/commit"));
        assert!(json.contains("TransactionDescriptor"));
    }
}
