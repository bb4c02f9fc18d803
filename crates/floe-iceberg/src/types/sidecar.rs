//! Sidecar key/value types.

use serde::{Deserialize, Serialize};

/// An auxiliary key/value entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SidecarEntry {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}
