//! Server configuration.

use std::collections::HashMap;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use floe_iceberg::RestConfig;

use crate::error::{ConfigError, Result};
use crate::observability::LogFormat;

/// Catalog backend selected at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// In-process catalog; state is lost on restart.
    #[default]
    Memory,
}

/// Browser origins allowed to call the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorsOrigins {
    /// No CORS headers are sent.
    #[default]
    Disabled,
    /// Any origin.
    Any,
    /// Exact origins, each a valid header value.
    List(Vec<String>),
}

/// CORS configuration for browser-based catalog clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins.
    pub origins: CorsOrigins,

    /// Preflight cache lifetime in seconds.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: CorsOrigins::Disabled,
            max_age_seconds: 600,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interface to bind.
    pub host: String,

    /// HTTP port to listen on.
    pub port: u16,

    /// Log output format; derived from `debug` when unset.
    #[serde(default)]
    pub log_format: Option<LogFormat>,

    /// Enable debug mode (pretty logs unless a format is set).
    pub debug: bool,

    /// Catalog backend.
    #[serde(default)]
    pub catalog_backend: CatalogBackend,

    /// Number of in-memory follower catalogs fed by every transaction.
    #[serde(default)]
    pub followers: usize,

    /// Defaults advertised by `/v1/config`.
    #[serde(default)]
    pub config_defaults: HashMap<String, String>,

    /// Overrides advertised by `/v1/config`.
    #[serde(default)]
    pub config_overrides: HashMap<String, String>,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Maximum number of requests handled concurrently.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_format: None,
            debug: false,
            catalog_backend: CatalogBackend::Memory,
            followers: 0,
            config_defaults: HashMap::new(),
            config_overrides: HashMap::new(),
            cors: CorsConfig::default(),
            concurrency_limit: None,
        }
    }
}

impl Config {
    /// Loads configuration from `FLOE_*` environment variables.
    ///
    /// Supported variables:
    /// - `FLOE_HOST`, `FLOE_PORT`
    /// - `FLOE_LOG_FORMAT` (`json` or `pretty`), `FLOE_DEBUG`
    /// - `FLOE_CATALOG_BACKEND` (`memory`), `FLOE_FOLLOWERS`
    /// - `FLOE_CONFIG_DEFAULTS`, `FLOE_CONFIG_OVERRIDES` (`k=v,k=v`)
    /// - `FLOE_CORS_ALLOWED_ORIGINS` (comma-separated, or `*`)
    /// - `FLOE_CORS_MAX_AGE_SECONDS`, `FLOE_CONCURRENCY_LIMIT`
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let mut config = Self::default();

        if let Some(host) = env.string("FLOE_HOST") {
            config.host = host;
        }
        if let Some(port) = env.u16("FLOE_PORT")? {
            config.port = port;
        }
        if let Some(format) = env.string("FLOE_LOG_FORMAT") {
            config.log_format = Some(parse_log_format("FLOE_LOG_FORMAT", &format)?);
        }
        if let Some(debug) = env.bool("FLOE_DEBUG")? {
            config.debug = debug;
        }
        if let Some(backend) = env.string("FLOE_CATALOG_BACKEND") {
            config.catalog_backend = parse_catalog_backend("FLOE_CATALOG_BACKEND", &backend)?;
        }
        if let Some(followers) = env.usize("FLOE_FOLLOWERS")? {
            config.followers = followers;
        }
        if let Some(raw) = env.string("FLOE_CONFIG_DEFAULTS") {
            config.config_defaults = parse_key_values("FLOE_CONFIG_DEFAULTS", &raw)?;
        }
        if let Some(raw) = env.string("FLOE_CONFIG_OVERRIDES") {
            config.config_overrides = parse_key_values("FLOE_CONFIG_OVERRIDES", &raw)?;
        }
        if let Some(origins) = env.string("FLOE_CORS_ALLOWED_ORIGINS") {
            config.cors.origins = parse_cors_origins("FLOE_CORS_ALLOWED_ORIGINS", &origins)?;
        }
        if let Some(max_age) = env.u64("FLOE_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }
        if let Some(limit) = env.usize("FLOE_CONCURRENCY_LIMIT")? {
            if limit == 0 {
                return Err(ConfigError::InvalidInput(
                    "FLOE_CONCURRENCY_LIMIT must be greater than zero".to_string(),
                ));
            }
            config.concurrency_limit = Some(limit);
        }

        Ok(config)
    }

    /// Returns the effective log format.
    #[must_use]
    pub fn effective_log_format(&self) -> LogFormat {
        match self.log_format {
            Some(format) => format,
            None if self.debug => LogFormat::Pretty,
            None => LogFormat::Json,
        }
    }

    /// Returns the catalog-facing configuration for the REST router.
    #[must_use]
    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            defaults: self.config_defaults.clone(),
            overrides: self.config_overrides.clone(),
            concurrency_limit: self.concurrency_limit,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u16(&self, name: &str) -> Result<Option<u16>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u16>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidInput(format!("{name} must be a u16: {e}")))
    }

    fn u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidInput(format!("{name} must be a u64: {e}")))
    }

    fn usize(&self, name: &str) -> Result<Option<usize>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidInput(format!("{name} must be a usize: {e}")))
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        parse_bool(name, &v).map(Some)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(ConfigError::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_log_format(name: &str, value: &str) -> Result<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        _ => Err(ConfigError::InvalidInput(format!(
            "{name} must be one of: json, pretty"
        ))),
    }
}

fn parse_catalog_backend(name: &str, value: &str) -> Result<CatalogBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(CatalogBackend::Memory),
        other => Err(ConfigError::InvalidInput(format!(
            "{name} has unsupported backend '{other}' (expected: memory)"
        ))),
    }
}

fn parse_key_values(name: &str, value: &str) -> Result<HashMap<String, String>> {
    let mut pairs = HashMap::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((key, val)) = entry.split_once('=') else {
            return Err(ConfigError::InvalidInput(format!(
                "{name} entry '{entry}' must have the form key=value"
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidInput(format!(
                "{name} entry '{entry}' has an empty key"
            )));
        }
        pairs.insert(key.to_string(), val.trim().to_string());
    }
    Ok(pairs)
}

fn parse_cors_origins(name: &str, value: &str) -> Result<CorsOrigins> {
    let origins: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match origins.as_slice() {
        [] => Ok(CorsOrigins::Disabled),
        ["*"] => Ok(CorsOrigins::Any),
        _ => origins
            .iter()
            .map(|origin| {
                if *origin == "*" {
                    return Err(ConfigError::InvalidInput(format!(
                        "{name} cannot mix '*' with explicit origins"
                    )));
                }
                HeaderValue::from_str(origin)
                    .map(|_| (*origin).to_string())
                    .map_err(|_| {
                        ConfigError::InvalidInput(format!("{name} has invalid origin '{origin}'"))
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(CorsOrigins::List),
    }
}
