//! Multi-operation transaction wire types.

use serde::{Deserialize, Serialize};

use floe_catalog::{TableIdent, TableRequirement, TableUpdate};

use super::sidecar::SidecarEntry;
use super::table::CreateTableRequest;

/// One operation in a `POST /v1/transactions/commit` batch.
///
/// Externally tagged: `{"create_table": {...}}`, `{"update_table": {...}}`
/// or `{"set_kv_sidecar": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDescriptor {
    /// Create a table.
    CreateTable(CreateTableDescriptor),
    /// Commit requirements and updates to an existing table.
    UpdateTable(UpdateTableDescriptor),
    /// Write a sidecar entry.
    SetKvSidecar(SidecarEntry),
}

impl TransactionDescriptor {
    /// Descriptor name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create_table",
            Self::UpdateTable(_) => "update_table",
            Self::SetKvSidecar(_) => "set_kv_sidecar",
        }
    }
}

/// Table creation inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateTableDescriptor {
    /// Flattened (`0x1F`-joined) namespace.
    pub namespace: String,

    /// Table definition.
    #[serde(flatten)]
    pub table: CreateTableRequest,
}

/// Table commit inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateTableDescriptor {
    /// Target table.
    pub identifier: TableIdent,

    /// Assertions checked before updates.
    #[serde(default)]
    pub requirements: Vec<TableRequirement>,

    /// Updates applied in order.
    #[serde(default)]
    pub updates: Vec<TableUpdate>,
}

/// Response from `POST /v1/transactions/commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommitTransactionResponse {
    /// Number of operations applied.
    pub committed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_tags() {
        let batch: Vec<TransactionDescriptor> = serde_json::from_value(serde_json::json!([
            {"create_table": {
                "namespace": "db\u{1F}raw",
                "name": "events",
                "schema": {"type": "struct", "schema-id": 0, "fields": []}
            }},
            {"update_table": {
                "identifier": {"namespace": ["db"], "name": "events"},
                "updates": [{"action": "remove-properties", "removals": ["a"]}]
            }},
            {"set_kv_sidecar": {"key": "owner", "value": "ops"}}
        ]))
        .expect("deserialize");

        let kinds: Vec<&str> = batch.iter().map(TransactionDescriptor::kind).collect();
        assert_eq!(kinds, vec!["create_table", "update_table", "set_kv_sidecar"]);

        match &batch[0] {
            TransactionDescriptor::CreateTable(create) => {
                assert_eq!(create.namespace, "db\u{1F}raw");
                assert_eq!(create.table.name, "events");
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let result: Result<TransactionDescriptor, _> =
            serde_json::from_value(serde_json::json!({"drop_table": {}}));
        assert!(result.is_err());
    }
}
