//! Multi-operation transaction types and the follower interface.

use async_trait::async_trait;

use crate::catalog::{Properties, Table, TableIdent};
use crate::error::CatalogResult;
use crate::metadata::{PartitionSpec, Schema, SortOrder};
use crate::update::{TableRequirement, TableUpdate};

/// Table creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableRequest {
    /// Identifier of the new table.
    pub ident: TableIdent,
    /// Initial schema.
    pub schema: Schema,
    /// Explicit root location; the backend chooses one when absent.
    pub location: Option<String>,
    /// Initial partition spec.
    pub partition_spec: Option<PartitionSpec>,
    /// Initial sort order.
    pub write_order: Option<SortOrder>,
    /// Initial properties.
    pub properties: Properties,
}

/// Commit against a previously loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitTableRequest {
    /// Table as loaded before the transaction was submitted.
    pub table: Table,
    /// Assertions checked against current metadata.
    pub requirements: Vec<TableRequirement>,
    /// Updates applied in order.
    pub updates: Vec<TableUpdate>,
}

/// One operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRequest {
    /// Create a table.
    CreateTable(CreateTableRequest),
    /// Commit updates to an existing table.
    CommitTable(CommitTableRequest),
    /// Write an auxiliary key/value entry.
    SetSidecar {
        /// Key.
        key: String,
        /// Value.
        value: String,
    },
}

impl TransactionRequest {
    /// Operation name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create_table",
            Self::CommitTable(_) => "commit_table",
            Self::SetSidecar { .. } => "set_sidecar",
        }
    }
}

/// A secondary catalog that receives every committed batch.
#[async_trait]
pub trait FollowerCatalog: Send + Sync + 'static {
    /// Follower name for logs and receipts.
    fn name(&self) -> &str;

    /// Applies a batch the primary has already committed.
    async fn replicate(&self, batch: &[TransactionRequest]) -> CatalogResult<()>;
}

/// A follower that failed to apply a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerFailure {
    /// Follower name.
    pub follower: String,
    /// Failure description.
    pub message: String,
}

/// Result of a committed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Number of operations applied on the primary.
    pub applied: usize,
    /// Followers that did not apply the batch.
    pub follower_failures: Vec<FollowerFailure>,
}

impl TransactionReceipt {
    /// True when every follower applied the batch.
    #[must_use]
    pub fn fully_propagated(&self) -> bool {
        self.follower_failures.is_empty()
    }
}

/// Sends a committed batch to each follower in order and collects failures.
pub async fn propagate(
    batch: &[TransactionRequest],
    followers: &[std::sync::Arc<dyn FollowerCatalog>],
) -> Vec<FollowerFailure> {
    let mut failures = Vec::new();
    for follower in followers {
        if let Err(err) = follower.replicate(batch).await {
            tracing::warn!(
                follower = %follower.name(),
                error = %err,
                "follower failed to apply committed batch"
            );
            failures.push(FollowerFailure {
                follower: follower.name().to_string(),
                message: err.to_string(),
            });
        }
    }
    failures
}
