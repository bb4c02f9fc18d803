//! Commit requirements and metadata updates.
//!
//! A commit checks every [`TableRequirement`] against the table's current
//! metadata and then applies [`TableUpdate`]s in submission order. Either
//! step failing leaves the stored metadata untouched; callers operate on a
//! copy and only persist it once both steps succeed.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::metadata::{
    PartitionSpec, Schema, Snapshot, SnapshotLogEntry, SnapshotReference, SortOrder,
    TableMetadata, MAIN_BRANCH,
};

/// Sentinel ID meaning "the last one added in this commit".
pub const LAST_ADDED: i32 = -1;

/// Optimistic-concurrency assertion checked before updates are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TableRequirement {
    /// The table must not exist yet.
    AssertCreate,

    /// The table UUID must match.
    AssertTableUuid {
        /// Expected UUID.
        uuid: Uuid,
    },

    /// A ref must point at a snapshot, or be absent when `snapshot-id` is null.
    AssertRefSnapshotId {
        /// Ref name.
        #[serde(rename = "ref")]
        ref_name: String,
        /// Expected snapshot ID.
        #[serde(rename = "snapshot-id")]
        snapshot_id: Option<i64>,
    },

    /// The last assigned column ID must match.
    AssertLastAssignedFieldId {
        /// Expected value.
        #[serde(rename = "last-assigned-field-id")]
        last_assigned_field_id: i32,
    },

    /// The current schema ID must match.
    AssertCurrentSchemaId {
        /// Expected value.
        #[serde(rename = "current-schema-id")]
        current_schema_id: i32,
    },

    /// The last assigned partition field ID must match.
    AssertLastAssignedPartitionId {
        /// Expected value.
        #[serde(rename = "last-assigned-partition-id")]
        last_assigned_partition_id: i32,
    },

    /// The default spec ID must match.
    AssertDefaultSpecId {
        /// Expected value.
        #[serde(rename = "default-spec-id")]
        default_spec_id: i32,
    },

    /// The default sort order ID must match.
    AssertDefaultSortOrderId {
        /// Expected value.
        #[serde(rename = "default-sort-order-id")]
        default_sort_order_id: i32,
    },
}

/// A single metadata change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum TableUpdate {
    /// Replace the table UUID.
    AssignUuid {
        /// New UUID.
        uuid: Uuid,
    },

    /// Raise the format version.
    UpgradeFormatVersion {
        /// Target version.
        #[serde(rename = "format-version")]
        format_version: i32,
    },

    /// Add a schema.
    AddSchema {
        /// The schema.
        schema: Schema,
        /// New highest column ID.
        #[serde(rename = "last-column-id", skip_serializing_if = "Option::is_none")]
        last_column_id: Option<i32>,
    },

    /// Make a schema current.
    SetCurrentSchema {
        /// Schema ID, or -1 for the schema added in this commit.
        #[serde(rename = "schema-id")]
        schema_id: i32,
    },

    /// Add a partition spec.
    AddSpec {
        /// The spec.
        spec: PartitionSpec,
    },

    /// Make a partition spec the default.
    SetDefaultSpec {
        /// Spec ID, or -1 for the spec added in this commit.
        #[serde(rename = "spec-id")]
        spec_id: i32,
    },

    /// Add a sort order.
    AddSortOrder {
        /// The order.
        #[serde(rename = "sort-order")]
        sort_order: SortOrder,
    },

    /// Make a sort order the default.
    SetDefaultSortOrder {
        /// Order ID, or -1 for the order added in this commit.
        #[serde(rename = "sort-order-id")]
        sort_order_id: i32,
    },

    /// Add a snapshot.
    AddSnapshot {
        /// The snapshot.
        snapshot: Snapshot,
    },

    /// Create or move a branch or tag.
    SetSnapshotRef {
        /// Ref name.
        #[serde(rename = "ref-name")]
        ref_name: String,
        /// The ref.
        #[serde(flatten)]
        reference: SnapshotReference,
    },

    /// Remove a branch or tag.
    RemoveSnapshotRef {
        /// Ref name.
        #[serde(rename = "ref-name")]
        ref_name: String,
    },

    /// Remove snapshots.
    RemoveSnapshots {
        /// Snapshot IDs.
        #[serde(rename = "snapshot-ids")]
        snapshot_ids: Vec<i64>,
    },

    /// Move the table root.
    SetLocation {
        /// New location.
        location: String,
    },

    /// Set properties.
    SetProperties {
        /// Properties to write.
        updates: HashMap<String, String>,
    },

    /// Remove properties.
    RemoveProperties {
        /// Keys to remove.
        removals: Vec<String>,
    },
}

/// Checks every requirement against `metadata`.
///
/// # Errors
///
/// Returns [`CatalogError::RequirementFailed`] for the first requirement
/// that does not hold.
pub fn check_requirements(
    metadata: &TableMetadata,
    requirements: &[TableRequirement],
) -> CatalogResult<()> {
    requirements
        .iter()
        .try_for_each(|requirement| check_requirement(metadata, requirement))
}

fn check_requirement(metadata: &TableMetadata, requirement: &TableRequirement) -> CatalogResult<()> {
    let failed = |message: String| Err(CatalogError::RequirementFailed { message });

    match requirement {
        TableRequirement::AssertCreate => failed("Table already exists".to_string()),
        TableRequirement::AssertTableUuid { uuid } => {
            if metadata.table_uuid == *uuid {
                Ok(())
            } else {
                failed(format!(
                    "Table UUID mismatch: expected {uuid}, found {}",
                    metadata.table_uuid
                ))
            }
        }
        TableRequirement::AssertRefSnapshotId {
            ref_name,
            snapshot_id,
        } => {
            let current = metadata.ref_snapshot_id(ref_name);
            if current == *snapshot_id {
                Ok(())
            } else {
                failed(format!(
                    "Ref '{ref_name}' snapshot mismatch: expected {snapshot_id:?}, found {current:?}"
                ))
            }
        }
        TableRequirement::AssertLastAssignedFieldId {
            last_assigned_field_id,
        } => expect_eq(
            "Last assigned field ID",
            *last_assigned_field_id,
            metadata.last_column_id,
        ),
        TableRequirement::AssertCurrentSchemaId { current_schema_id } => expect_eq(
            "Current schema ID",
            *current_schema_id,
            metadata.current_schema_id,
        ),
        TableRequirement::AssertLastAssignedPartitionId {
            last_assigned_partition_id,
        } => expect_eq(
            "Last assigned partition ID",
            *last_assigned_partition_id,
            metadata.last_partition_id,
        ),
        TableRequirement::AssertDefaultSpecId { default_spec_id } => expect_eq(
            "Default spec ID",
            *default_spec_id,
            metadata.default_spec_id,
        ),
        TableRequirement::AssertDefaultSortOrderId {
            default_sort_order_id,
        } => expect_eq(
            "Default sort order ID",
            *default_sort_order_id,
            metadata.default_sort_order_id,
        ),
    }
}

fn expect_eq(what: &str, expected: i32, found: i32) -> CatalogResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CatalogError::RequirementFailed {
            message: format!("{what} mismatch: expected {expected}, found {found}"),
        })
    }
}

/// IDs added earlier in the same commit, used to resolve [`LAST_ADDED`].
#[derive(Debug, Default)]
struct Added {
    schema_id: Option<i32>,
    spec_id: Option<i32>,
    sort_order_id: Option<i32>,
}

/// Applies updates to `metadata` in order.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidUpdate`] if an update references a missing
/// schema, spec, order or snapshot, or would move a monotonic field backwards.
pub fn apply_updates(metadata: &mut TableMetadata, updates: &[TableUpdate]) -> CatalogResult<()> {
    let mut added = Added::default();
    for update in updates {
        apply_update(metadata, update, &mut added)?;
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> CatalogError {
    CatalogError::InvalidUpdate {
        message: message.into(),
    }
}

fn resolve(id: i32, added: Option<i32>, what: &str) -> CatalogResult<i32> {
    if id != LAST_ADDED {
        return Ok(id);
    }
    added.ok_or_else(|| invalid(format!("Cannot set last added {what}: none was added")))
}

#[allow(clippy::too_many_lines)]
fn apply_update(
    metadata: &mut TableMetadata,
    update: &TableUpdate,
    added: &mut Added,
) -> CatalogResult<()> {
    match update {
        TableUpdate::AssignUuid { uuid } => {
            metadata.table_uuid = *uuid;
        }
        TableUpdate::UpgradeFormatVersion { format_version } => {
            if *format_version < metadata.format_version {
                return Err(invalid("format-version cannot be downgraded"));
            }
            metadata.format_version = *format_version;
        }
        TableUpdate::AddSchema {
            schema,
            last_column_id,
        } => {
            if metadata
                .schemas
                .iter()
                .any(|s| s.schema_id == schema.schema_id)
            {
                return Err(invalid(format!(
                    "Schema {} already exists",
                    schema.schema_id
                )));
            }
            metadata.last_column_id = metadata.last_column_id.max(schema.highest_field_id());
            if let Some(last_column_id) = last_column_id {
                if *last_column_id < metadata.last_column_id {
                    return Err(invalid("last-column-id cannot move backwards"));
                }
                metadata.last_column_id = *last_column_id;
            }
            added.schema_id = Some(schema.schema_id);
            metadata.schemas.push(schema.clone());
        }
        TableUpdate::SetCurrentSchema { schema_id } => {
            let schema_id = resolve(*schema_id, added.schema_id, "schema")?;
            if !metadata.schemas.iter().any(|s| s.schema_id == schema_id) {
                return Err(invalid(format!("Schema {schema_id} does not exist")));
            }
            metadata.current_schema_id = schema_id;
        }
        TableUpdate::AddSpec { spec } => {
            if metadata
                .partition_specs
                .iter()
                .any(|s| s.spec_id == spec.spec_id)
            {
                return Err(invalid(format!(
                    "Partition spec {} already exists",
                    spec.spec_id
                )));
            }
            if let Some(max_field_id) = spec.fields.iter().map(|f| f.field_id).max() {
                metadata.last_partition_id = metadata.last_partition_id.max(max_field_id);
            }
            added.spec_id = Some(spec.spec_id);
            metadata.partition_specs.push(spec.clone());
        }
        TableUpdate::SetDefaultSpec { spec_id } => {
            let spec_id = resolve(*spec_id, added.spec_id, "partition spec")?;
            if !metadata.partition_specs.iter().any(|s| s.spec_id == spec_id) {
                return Err(invalid(format!("Partition spec {spec_id} does not exist")));
            }
            metadata.default_spec_id = spec_id;
        }
        TableUpdate::AddSortOrder { sort_order } => {
            if metadata
                .sort_orders
                .iter()
                .any(|o| o.order_id == sort_order.order_id)
            {
                return Err(invalid(format!(
                    "Sort order {} already exists",
                    sort_order.order_id
                )));
            }
            added.sort_order_id = Some(sort_order.order_id);
            metadata.sort_orders.push(sort_order.clone());
        }
        TableUpdate::SetDefaultSortOrder { sort_order_id } => {
            let order_id = resolve(*sort_order_id, added.sort_order_id, "sort order")?;
            if !metadata.sort_orders.iter().any(|o| o.order_id == order_id) {
                return Err(invalid(format!("Sort order {order_id} does not exist")));
            }
            metadata.default_sort_order_id = order_id;
        }
        TableUpdate::AddSnapshot { snapshot } => {
            if metadata
                .snapshots
                .iter()
                .any(|s| s.snapshot_id == snapshot.snapshot_id)
            {
                return Err(invalid(format!(
                    "Snapshot {} already exists",
                    snapshot.snapshot_id
                )));
            }
            metadata.last_sequence_number =
                metadata.last_sequence_number.max(snapshot.sequence_number);
            metadata.snapshots.push(snapshot.clone());
        }
        TableUpdate::SetSnapshotRef {
            ref_name,
            reference,
        } => {
            if reference.ref_type != "branch" && reference.ref_type != "tag" {
                return Err(invalid(format!(
                    "Unsupported snapshot ref type: {}",
                    reference.ref_type
                )));
            }
            let snapshot = metadata
                .snapshots
                .iter()
                .find(|s| s.snapshot_id == reference.snapshot_id)
                .ok_or_else(|| {
                    invalid(format!(
                        "Snapshot {} does not exist",
                        reference.snapshot_id
                    ))
                })?;
            let timestamp_ms = snapshot.timestamp_ms;
            metadata.refs.insert(ref_name.clone(), reference.clone());
            if ref_name == MAIN_BRANCH {
                metadata.current_snapshot_id = Some(reference.snapshot_id);
                metadata.snapshot_log.push(SnapshotLogEntry {
                    snapshot_id: reference.snapshot_id,
                    timestamp_ms,
                });
            }
        }
        TableUpdate::RemoveSnapshotRef { ref_name } => {
            metadata.refs.remove(ref_name);
            if ref_name == MAIN_BRANCH {
                metadata.current_snapshot_id = None;
            }
        }
        TableUpdate::RemoveSnapshots { snapshot_ids } => {
            let ids: HashSet<i64> = snapshot_ids.iter().copied().collect();
            metadata.snapshots.retain(|s| !ids.contains(&s.snapshot_id));
            metadata.refs.retain(|_, r| !ids.contains(&r.snapshot_id));
            if metadata
                .current_snapshot_id
                .is_some_and(|id| ids.contains(&id))
            {
                metadata.current_snapshot_id = None;
            }
        }
        TableUpdate::SetLocation { location } => {
            if location.trim().is_empty() {
                return Err(invalid("Table location cannot be empty"));
            }
            metadata.location.clone_from(location);
        }
        TableUpdate::SetProperties { updates } => {
            metadata
                .properties
                .extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        TableUpdate::RemoveProperties { removals } => {
            for key in removals {
                metadata.properties.remove(key);
            }
        }
    }

    metadata.last_updated_ms = Utc::now().timestamp_millis();
    Ok(())
}
