//! Multi-operation transaction orchestration.
//!
//! A batch of heterogeneous descriptors is committed atomically:
//!
//! 1. **Load**: every `update_table` target is loaded from the primary
//! 2. **Map**: each descriptor becomes a [`TransactionRequest`] (pure)
//! 3. **Submit**: the whole batch goes to [`Catalog::transaction`] once,
//!    together with the configured followers
//! 4. **Report**: a primary failure maps through the error taxonomy; a
//!    committed batch that did not reach every follower is a
//!    `FollowerPropagationException`
//!
//! [`Catalog::transaction`]: floe_catalog::Catalog::transaction

use floe_catalog::{
    CommitTableRequest, CreateTableRequest, Table, TableIdent, TransactionRequest,
};

use crate::error::{RestError, RestResult};
use crate::ident::{parse_namespace, validate_namespace, validate_table_name};
use crate::metrics::{record_batch, record_commit_conflict, record_follower_failure, CommitScope};
use crate::state::AppState;
use crate::types::{self, TransactionDescriptor};

/// Returns the table a descriptor needs loaded before mapping, if any.
#[must_use]
pub fn table_to_load(descriptor: &TransactionDescriptor) -> Option<&TableIdent> {
    match descriptor {
        TransactionDescriptor::UpdateTable(update) => Some(&update.identifier),
        TransactionDescriptor::CreateTable(_) | TransactionDescriptor::SetKvSidecar(_) => None,
    }
}

/// Maps a wire descriptor to a catalog request.
///
/// `loaded` must be the table named by [`table_to_load`] for `update_table`
/// descriptors and is ignored otherwise.
///
/// # Errors
///
/// - malformed request for invalid identifiers
/// - not implemented for staged creation
pub fn into_request(
    descriptor: TransactionDescriptor,
    loaded: Option<Table>,
) -> RestResult<TransactionRequest> {
    match descriptor {
        TransactionDescriptor::CreateTable(create) => {
            let namespace = parse_namespace(&create.namespace)?;
            Ok(TransactionRequest::CreateTable(create_request(
                namespace,
                create.table,
            )?))
        }
        TransactionDescriptor::UpdateTable(update) => {
            let table = loaded.ok_or_else(|| {
                RestError::internal(format!("table {} was not loaded", update.identifier))
            })?;
            Ok(TransactionRequest::CommitTable(CommitTableRequest {
                table,
                requirements: update.requirements,
                updates: update.updates,
            }))
        }
        TransactionDescriptor::SetKvSidecar(entry) => Ok(TransactionRequest::SetSidecar {
            key: entry.key,
            value: entry.value,
        }),
    }
}

/// Converts a wire create-table body into a catalog request.
///
/// # Errors
///
/// - malformed request for an empty table name
/// - not implemented for `stage-create`
pub fn create_request(
    namespace: Vec<String>,
    table: types::CreateTableRequest,
) -> RestResult<CreateTableRequest> {
    if table.stage_create {
        return Err(RestError::NotImplemented {
            operation: "stage-create",
        });
    }
    validate_table_name(&table.name)?;
    Ok(CreateTableRequest {
        ident: TableIdent::new(namespace, table.name),
        schema: table.schema,
        location: table.location,
        partition_spec: table.partition_spec,
        write_order: table.write_order,
        properties: table.properties,
    })
}

/// Commits a batch atomically and returns the number of applied operations.
///
/// # Errors
///
/// - malformed request for an empty batch or invalid descriptors
/// - any taxonomy error from loading or committing on the primary
/// - follower propagation when the primary committed but a follower failed
pub async fn commit_transaction(
    state: &AppState,
    descriptors: Vec<TransactionDescriptor>,
) -> RestResult<usize> {
    if descriptors.is_empty() {
        return Err(RestError::malformed("Transaction must contain at least one operation"));
    }

    let mut requests = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let loaded = match table_to_load(&descriptor) {
            Some(ident) => {
                validate_namespace(&ident.namespace)?;
                validate_table_name(&ident.name)?;
                Some(state.catalog.load_table(ident).await?)
            }
            None => None,
        };
        requests.push(into_request(descriptor, loaded)?);
    }

    let operations = requests.len();
    tracing::debug!(operations, followers = state.followers.len(), "submitting transaction");

    let receipt = state
        .catalog
        .transaction(requests, &state.followers)
        .await
        .map_err(|err| {
            let err = RestError::from(err);
            if matches!(err, RestError::CommitFailed { .. }) {
                record_commit_conflict(CommitScope::Batch);
            }
            err
        })?;
    record_batch(receipt.applied);

    if !receipt.fully_propagated() {
        let followers: Vec<String> = receipt
            .follower_failures
            .into_iter()
            .map(|failure| {
                tracing::warn!(
                    follower = %failure.follower,
                    error = %failure.message,
                    "committed transaction not applied by follower"
                );
                record_follower_failure(&failure.follower);
                failure.follower
            })
            .collect();
        return Err(RestError::FollowerPropagation { followers });
    }

    Ok(receipt.applied)
}
