//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the store takes ownership of its
//! storage root.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory exists, is a directory and accepts writes.
///
/// A read-only or misconfigured save directory should stop the process at
/// startup instead of failing every save request later.
pub async fn ensure_data_dir(data_dir: &Path) -> anyhow::Result<()> {
    let dir = data_dir.display().to_string();
    if tokio::fs::metadata(data_dir).await.is_err() {
        warn!(data_dir = %dir, "data directory not found; creating it");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;

    let meta = tokio::fs::metadata(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot stat {dir}: {e}"))?;
    if !meta.is_dir() {
        anyhow::bail!("{dir} exists but is not a directory");
    }

    // 写入探测文件，确认目录可写
    let probe = data_dir.join(format!(".probe-{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{dir} is not writable: {e}"))?;
    let _ = tokio::fs::remove_file(&probe).await;

    info!(data_dir = %dir, "data directory ready");
    Ok(())
}
