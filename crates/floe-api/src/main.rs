//! `floe-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use anyhow::Result;

use floe_api::config::Config;
use floe_api::observability::init_logging;
use floe_api::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_logging(config.effective_log_format());

    if config.followers > 0 {
        tracing::info!(
            followers = config.followers,
            "Propagating committed transactions to in-memory followers"
        );
    }
    tracing::warn!(
        backend = ?config.catalog_backend,
        "Catalog state is held in memory and lost on restart"
    );

    let server = Server::new(config);
    server.serve().await?;
    Ok(())
}
