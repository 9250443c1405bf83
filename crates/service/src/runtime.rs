//! Runtime wiring
//!
//! Builds the record store selected by configuration. Called once at process
//! start; the returned handle is what the HTTP layer shares between requests.

use std::sync::Arc;

use configs::{StorageBackend, StorageConfig};
use tracing::info;

use crate::storage::{FileRecordStore, MemoryRecordStore, RecordFields, RecordStore, StoreOptions};

pub fn store_options(cfg: &StorageConfig) -> StoreOptions {
    StoreOptions {
        fields: RecordFields::new(cfg.username_field.clone(), cfg.credential_field.clone()),
        pretty: cfg.pretty,
    }
}

/// Open the configured backend. The file backend checks its directory is
/// writable first so a bad `storage.root` fails startup, not the first save.
pub async fn open_store(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    let options = store_options(cfg);
    let store: Arc<dyn RecordStore> = match cfg.backend {
        StorageBackend::File => {
            common::env::ensure_data_dir(&cfg.root).await?;
            let store = FileRecordStore::open(&cfg.root, options).await?;
            info!(backend = "file", root = %store.root().display(), "record store opened");
            store
        }
        StorageBackend::Memory => {
            info!(backend = "memory", "record store opened; saves will not survive a restart");
            MemoryRecordStore::new(options)
        }
    };
    Ok(store)
}
