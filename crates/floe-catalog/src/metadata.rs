//! Table metadata model.
//!
//! Field names follow the Iceberg table metadata JSON layout so that the REST
//! layer can hand metadata to clients unchanged.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current metadata format version for newly created tables.
pub const DEFAULT_FORMAT_VERSION: i32 = 2;

/// Name of the branch that tracks the current snapshot.
pub const MAIN_BRANCH: &str = "main";

/// Complete metadata for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TableMetadata {
    /// Format version (1 or 2).
    #[serde(rename = "format-version")]
    pub format_version: i32,

    /// Unique table identifier.
    #[serde(rename = "table-uuid")]
    pub table_uuid: Uuid,

    /// Table root location.
    pub location: String,

    /// Last sequence number assigned.
    #[serde(rename = "last-sequence-number")]
    pub last_sequence_number: i64,

    /// Last updated timestamp in milliseconds.
    #[serde(rename = "last-updated-ms")]
    pub last_updated_ms: i64,

    /// Highest assigned column ID.
    #[serde(rename = "last-column-id")]
    pub last_column_id: i32,

    /// Current schema ID.
    #[serde(rename = "current-schema-id")]
    pub current_schema_id: i32,

    /// All schemas.
    pub schemas: Vec<Schema>,

    /// Current snapshot ID.
    #[serde(rename = "current-snapshot-id")]
    pub current_snapshot_id: Option<i64>,

    /// All snapshots.
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,

    /// History of current-snapshot changes.
    #[serde(rename = "snapshot-log", default)]
    pub snapshot_log: Vec<SnapshotLogEntry>,

    /// History of previous metadata files.
    #[serde(rename = "metadata-log", default)]
    pub metadata_log: Vec<MetadataLogEntry>,

    /// Table properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Default partition spec ID.
    #[serde(rename = "default-spec-id")]
    pub default_spec_id: i32,

    /// Partition specs.
    #[serde(rename = "partition-specs")]
    pub partition_specs: Vec<PartitionSpec>,

    /// Highest assigned partition field ID.
    #[serde(rename = "last-partition-id")]
    pub last_partition_id: i32,

    /// Branches and tags.
    #[serde(default)]
    pub refs: HashMap<String, SnapshotReference>,

    /// Default sort order ID.
    #[serde(rename = "default-sort-order-id")]
    pub default_sort_order_id: i32,

    /// Sort orders.
    #[serde(rename = "sort-orders")]
    pub sort_orders: Vec<SortOrder>,
}

impl TableMetadata {
    /// Builds the initial metadata for a new table.
    ///
    /// Missing partition spec and sort order default to the unpartitioned
    /// spec (ID 0) and the unsorted order (ID 0).
    #[must_use]
    pub fn initial(
        location: impl Into<String>,
        schema: Schema,
        partition_spec: Option<PartitionSpec>,
        sort_order: Option<SortOrder>,
        properties: HashMap<String, String>,
    ) -> Self {
        let partition_spec = partition_spec.unwrap_or_else(PartitionSpec::unpartitioned);
        let sort_order = sort_order.unwrap_or_else(SortOrder::unsorted);

        Self {
            format_version: DEFAULT_FORMAT_VERSION,
            table_uuid: Uuid::new_v4(),
            location: location.into(),
            last_sequence_number: 0,
            last_updated_ms: Utc::now().timestamp_millis(),
            last_column_id: schema.highest_field_id(),
            current_schema_id: schema.schema_id,
            current_snapshot_id: None,
            snapshots: Vec::new(),
            snapshot_log: Vec::new(),
            metadata_log: Vec::new(),
            properties,
            default_spec_id: partition_spec.spec_id,
            last_partition_id: partition_spec.highest_field_id(),
            partition_specs: vec![partition_spec],
            refs: HashMap::new(),
            default_sort_order_id: sort_order.order_id,
            sort_orders: vec![sort_order],
            schemas: vec![schema],
        }
    }

    /// Returns the snapshot a ref points at. `main` falls back to the
    /// current snapshot when no explicit ref exists.
    #[must_use]
    pub fn ref_snapshot_id(&self, ref_name: &str) -> Option<i64> {
        self.refs
            .get(ref_name)
            .map(|r| r.snapshot_id)
            .or_else(|| {
                if ref_name == MAIN_BRANCH {
                    self.current_snapshot_id
                } else {
                    None
                }
            })
    }

    /// Returns the current schema, if present.
    #[must_use]
    pub fn current_schema(&self) -> Option<&Schema> {
        self.schemas
            .iter()
            .find(|s| s.schema_id == self.current_schema_id)
    }
}

/// A table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Schema {
    /// Schema ID.
    #[serde(rename = "schema-id", default)]
    pub schema_id: i32,

    /// Always `struct` for table schemas.
    #[serde(rename = "type", default = "default_struct_type")]
    pub schema_type: String,

    /// Top-level fields.
    #[serde(default)]
    pub fields: Vec<SchemaField>,

    /// IDs of fields that identify a row.
    #[serde(
        rename = "identifier-field-ids",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub identifier_field_ids: Vec<i32>,
}

impl Schema {
    /// Returns the highest top-level field ID, or 0 for an empty schema.
    #[must_use]
    pub fn highest_field_id(&self) -> i32 {
        self.fields.iter().map(|f| f.id).max().unwrap_or(0)
    }
}

fn default_struct_type() -> String {
    "struct".to_string()
}

/// A field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SchemaField {
    /// Field ID.
    pub id: i32,

    /// Field name.
    pub name: String,

    /// Whether the field is required.
    pub required: bool,

    /// Primitive type name or nested type object.
    #[serde(rename = "type")]
    #[schema(value_type = Object)]
    pub field_type: serde_json::Value,

    /// Optional documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// A snapshot of table contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Snapshot {
    /// Snapshot ID.
    #[serde(rename = "snapshot-id")]
    pub snapshot_id: i64,

    /// Parent snapshot ID.
    #[serde(rename = "parent-snapshot-id", skip_serializing_if = "Option::is_none")]
    pub parent_snapshot_id: Option<i64>,

    /// Sequence number.
    #[serde(rename = "sequence-number", default)]
    pub sequence_number: i64,

    /// Creation time in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,

    /// Manifest list location.
    #[serde(rename = "manifest-list")]
    pub manifest_list: String,

    /// Operation summary.
    #[serde(default)]
    pub summary: HashMap<String, String>,

    /// Schema in effect when the snapshot was written.
    #[serde(rename = "schema-id", skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<i32>,
}

/// Snapshot log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SnapshotLogEntry {
    /// Snapshot ID.
    #[serde(rename = "snapshot-id")]
    pub snapshot_id: i64,

    /// Timestamp in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,
}

/// Metadata log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetadataLogEntry {
    /// Previous metadata file.
    #[serde(rename = "metadata-file")]
    pub metadata_file: String,

    /// Timestamp in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,
}

/// Partition specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PartitionSpec {
    /// Spec ID.
    #[serde(rename = "spec-id", default)]
    pub spec_id: i32,

    /// Partition fields.
    #[serde(default)]
    pub fields: Vec<PartitionField>,
}

impl PartitionSpec {
    /// The unpartitioned spec.
    #[must_use]
    pub fn unpartitioned() -> Self {
        Self {
            spec_id: 0,
            fields: Vec::new(),
        }
    }

    fn highest_field_id(&self) -> i32 {
        // Partition field IDs start at 1000.
        self.fields.iter().map(|f| f.field_id).max().unwrap_or(999)
    }
}

/// A partition field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PartitionField {
    /// Partition field ID.
    #[serde(rename = "field-id")]
    pub field_id: i32,

    /// Source column ID.
    #[serde(rename = "source-id")]
    pub source_id: i32,

    /// Partition field name.
    pub name: String,

    /// Transform (identity, bucket[N], day, ...).
    pub transform: String,
}

/// A branch or tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SnapshotReference {
    /// Referenced snapshot.
    #[serde(rename = "snapshot-id")]
    pub snapshot_id: i64,

    /// `branch` or `tag`.
    #[serde(rename = "type")]
    pub ref_type: String,

    /// Max ref age (branches and tags).
    #[serde(rename = "max-ref-age-ms", skip_serializing_if = "Option::is_none")]
    pub max_ref_age_ms: Option<i64>,

    /// Max snapshot age (branches only).
    #[serde(rename = "max-snapshot-age-ms", skip_serializing_if = "Option::is_none")]
    pub max_snapshot_age_ms: Option<i64>,

    /// Minimum snapshots to keep (branches only).
    #[serde(rename = "min-snapshots-to-keep", skip_serializing_if = "Option::is_none")]
    pub min_snapshots_to_keep: Option<i32>,
}

/// Sort order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SortOrder {
    /// Order ID.
    #[serde(rename = "order-id", default)]
    pub order_id: i32,

    /// Sort fields.
    #[serde(default)]
    pub fields: Vec<SortField>,
}

impl SortOrder {
    /// The unsorted order.
    #[must_use]
    pub fn unsorted() -> Self {
        Self {
            order_id: 0,
            fields: Vec::new(),
        }
    }
}

/// A sort field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SortField {
    /// Source column ID.
    #[serde(rename = "source-id")]
    pub source_id: i32,

    /// Transform.
    pub transform: String,

    /// `asc` or `desc`.
    pub direction: String,

    /// `nulls-first` or `nulls-last`.
    #[serde(rename = "null-order")]
    pub null_order: String,
}
