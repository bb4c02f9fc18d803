//! Namespace request and response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use floe_catalog::NamespaceIdent;

/// Response from `GET /v1/namespaces`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListNamespacesResponse {
    /// Namespace identifiers.
    pub namespaces: Vec<NamespaceIdent>,

    /// Token for the next page; `null` when exhausted.
    #[serde(rename = "next-page-token", default)]
    pub next_page_token: Option<String>,
}

/// Query parameters for listing namespaces.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNamespacesQuery {
    /// Flattened parent namespace; descendants of it are returned.
    #[serde(default)]
    pub parent: Option<String>,

    /// Opaque page token.
    #[serde(rename = "pageToken")]
    pub page_token: Option<String>,

    /// Maximum number of results.
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

/// Request body for `POST /v1/namespaces`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateNamespaceRequest {
    /// Namespace to create.
    pub namespace: NamespaceIdent,

    /// Initial properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Response from `POST /v1/namespaces`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateNamespaceResponse {
    /// Created namespace.
    pub namespace: NamespaceIdent,

    /// Properties as submitted.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Response from `GET /v1/namespaces/{namespace}`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GetNamespaceResponse {
    /// Namespace identifier.
    pub namespace: NamespaceIdent,

    /// Namespace properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Request body for `POST /v1/namespaces/{namespace}/properties`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateNamespacePropertiesRequest {
    /// Keys to remove.
    #[serde(default)]
    pub removals: Vec<String>,

    /// Keys to set.
    #[serde(default)]
    pub updates: HashMap<String, String>,
}

/// Response from `POST /v1/namespaces/{namespace}/properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateNamespacePropertiesResponse {
    /// Keys written.
    pub updated: Vec<String>,
    /// Requested removals that were present.
    pub removed: Vec<String>,
    /// Requested removals that were absent.
    pub missing: Vec<String>,
}
