//! Shared state and configuration for REST handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use floe_catalog::{Catalog, FollowerCatalog};

/// Server-side configuration for the REST API.
#[derive(Debug, Clone, Default)]
pub struct RestConfig {
    /// Defaults advertised in `/v1/config`.
    pub defaults: HashMap<String, String>,
    /// Overrides advertised in `/v1/config`.
    pub overrides: HashMap<String, String>,
    /// Optional concurrency limit for handlers.
    pub concurrency_limit: Option<usize>,
}

/// Shared state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    /// Primary catalog.
    pub catalog: Arc<dyn Catalog>,
    /// Catalogs that receive every committed transaction.
    pub followers: Arc<[Arc<dyn FollowerCatalog>]>,
    /// Server-side configuration.
    pub config: RestConfig,
}

impl AppState {
    /// Creates state with default configuration and no followers.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::with_config(catalog, RestConfig::default())
    }

    /// Creates state with explicit configuration.
    #[must_use]
    pub fn with_config(catalog: Arc<dyn Catalog>, config: RestConfig) -> Self {
        Self {
            catalog,
            followers: Arc::from(Vec::new()),
            config,
        }
    }

    /// Sets the follower catalogs.
    #[must_use]
    pub fn with_followers(mut self, followers: Vec<Arc<dyn FollowerCatalog>>) -> Self {
        self.followers = Arc::from(followers);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("catalog", &self.catalog.catalog_type())
            .field(
                "followers",
                &self.followers.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}
