//! Namespace property update reconciliation.

use std::collections::HashMap;

use floe_catalog::PropertiesUpdateSummary;

use crate::error::{RestError, RestResult};
use crate::types::UpdateNamespacePropertiesResponse;

/// Fails when any key is both removed and updated.
///
/// # Errors
///
/// Returns [`RestError::DuplicateKey`] listing the overlapping keys, sorted.
pub fn ensure_disjoint(removals: &[String], updates: &HashMap<String, String>) -> RestResult<()> {
    let mut overlap: Vec<String> = removals
        .iter()
        .filter(|key| updates.contains_key(*key))
        .cloned()
        .collect();
    if overlap.is_empty() {
        return Ok(());
    }
    overlap.sort();
    overlap.dedup();
    Err(RestError::DuplicateKey { keys: overlap })
}

impl From<PropertiesUpdateSummary> for UpdateNamespacePropertiesResponse {
    fn from(summary: PropertiesUpdateSummary) -> Self {
        Self {
            updated: summary.updated,
            removed: summary.removed,
            missing: summary.missing,
        }
    }
}
