use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gin_count::{
    config::Config,
    router,
    services::{FileBackend, Ledger, StoreError},
    AppState,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// A file that fails to parse at startup is moved aside so the service starts
/// on an empty ledger without overwriting it.
fn open_ledger(config: &Config) -> Result<Ledger> {
    let ledger = Ledger::new(FileBackend::new(config.data_path()));
    match ledger.load() {
        Ok(entries) => {
            info!(path = %config.data_path().display(), entries = entries.len(), "ledger loaded");
        }
        Err(StoreError::Corrupt { path, source }) => {
            warn!(path = %path.display(), error = %source, "ledger file is corrupt");
            ledger
                .quarantine()
                .with_context(|| format!("Failed to move corrupt ledger {} aside", path.display()))?;
        }
        Err(e) => return Err(e).context("Failed to read ledger"),
    }
    Ok(ledger)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_env();
    let state = Arc::new(AppState::new(open_ledger(&config)?));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address()))?;

    info!("Ramin Gin Count running at http://localhost:{}", config.port);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
