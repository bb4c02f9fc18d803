//! Table request and response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use floe_catalog::metadata::{PartitionSpec, Schema, SortOrder, TableMetadata};
use floe_catalog::{Table, TableIdent, TableRequirement, TableUpdate};

use crate::error::{RestError, RestResult};

/// Response from `GET /v1/namespaces/{namespace}/tables`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListTablesResponse {
    /// Table identifiers.
    pub identifiers: Vec<TableIdent>,

    /// Token for the next page.
    #[serde(rename = "next-page-token", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Query parameters for listing tables.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTablesQuery {
    /// Opaque page token.
    #[serde(rename = "pageToken")]
    pub page_token: Option<String>,

    /// Maximum number of results.
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

/// Request body for `POST /v1/namespaces/{namespace}/tables`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTableRequest {
    /// Table name.
    pub name: String,

    /// Initial schema.
    pub schema: Schema,

    /// Explicit table location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Initial partition spec.
    #[serde(
        rename = "partition-spec",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub partition_spec: Option<PartitionSpec>,

    /// Initial sort order.
    #[serde(rename = "write-order", default, skip_serializing_if = "Option::is_none")]
    pub write_order: Option<SortOrder>,

    /// Staged creation. Not supported.
    #[serde(rename = "stage-create", default)]
    pub stage_create: bool,

    /// Initial properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Response carrying a table's metadata.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoadTableResponse {
    /// Current metadata file location.
    #[serde(rename = "metadata-location")]
    pub metadata_location: String,

    /// Table metadata, as produced by the catalog.
    #[schema(value_type = TableMetadata)]
    pub metadata: serde_json::Value,

    /// Per-table client configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, String>,
}

impl LoadTableResponse {
    /// Builds the response for a table handle.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the metadata cannot be serialized.
    pub fn from_table(table: &Table) -> RestResult<Self> {
        Ok(Self {
            metadata_location: table.metadata_location.clone(),
            metadata: metadata_json(&table.metadata)?,
            config: HashMap::new(),
        })
    }
}

/// Request body for `POST /v1/namespaces/{namespace}/tables/{table}`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommitTableRequest {
    /// Optional identifier; must match the path when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<TableIdent>,

    /// Assertions checked before updates.
    #[serde(default)]
    pub requirements: Vec<TableRequirement>,

    /// Updates applied in order.
    #[serde(default)]
    pub updates: Vec<TableUpdate>,
}

/// Response from a table commit.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommitTableResponse {
    /// New metadata file location.
    #[serde(rename = "metadata-location")]
    pub metadata_location: String,

    /// New metadata.
    #[schema(value_type = TableMetadata)]
    pub metadata: serde_json::Value,
}

impl CommitTableResponse {
    /// Builds the response for a committed table.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the metadata cannot be serialized.
    pub fn from_table(table: &Table) -> RestResult<Self> {
        Ok(Self {
            metadata_location: table.metadata_location.clone(),
            metadata: metadata_json(&table.metadata)?,
        })
    }
}

fn metadata_json(metadata: &TableMetadata) -> RestResult<serde_json::Value> {
    serde_json::to_value(metadata)
        .map_err(|e| RestError::internal(format!("failed to serialize table metadata: {e}")))
}

/// Query parameters for dropping a table.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DropTableQuery {
    /// Also delete data files. Not supported.
    #[serde(rename = "purgeRequested", default)]
    pub purge_requested: bool,
}

/// Request body for `POST /v1/tables/rename`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RenameTableRequest {
    /// Existing table.
    pub source: TableIdent,
    /// New identifier.
    pub destination: TableIdent,
}
