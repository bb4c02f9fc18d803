//! `/v1/config` types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Server configuration returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConfigResponse {
    /// Client-side defaults the client may override.
    pub defaults: HashMap<String, String>,
    /// Settings that take precedence over client configuration.
    pub overrides: HashMap<String, String>,
}

/// Query parameters for `/v1/config`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfigQuery {
    /// Requested warehouse. Accepted and ignored.
    pub warehouse: Option<String>,
}
