//! Vendit connector binary
//!
//! Loads configuration, wires the authenticator, gateway and stores
//! together, then syncs every stream sequentially. Records go to stdout
//! as JSON lines; logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vendit_infra::{Authenticator, FileStateStore, JsonLinesWriter, TokenStore, VenditGateway};

mod runner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging first; stdout stays reserved for the record stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let config =
        Arc::new(vendit_infra::config::load().context("failed to load configuration")?);
    let run_id = uuid::Uuid::new_v4();
    info!(%run_id, api_url = %config.api_url, "vendit connector starting");

    let client = vendit_infra::http::build_client(&config)?;
    let token_store = TokenStore::new(&config.secrets_path);
    let auth = Arc::new(Authenticator::new(Arc::clone(&config), client.clone(), token_store));
    let gateway = VenditGateway::new(client, auth);
    let state_store = FileStateStore::new(&config.state_path);
    let mut out = JsonLinesWriter::stdout();

    runner::run_all(&config, &gateway, &state_store, &mut out)
        .await
        .context("sync run failed")?;

    info!(%run_id, "sync run complete");
    Ok(())
}
