//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the data directory exists; warn when a configured store file is
/// not there yet (a fresh one is created on first use).
pub async fn ensure_env(data_dir: &str, store_file: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    if tokio::fs::metadata(store_file).await.is_err() {
        warn!(%store_file, "store file not found; it will be created on first use");
    }
    Ok(())
}
