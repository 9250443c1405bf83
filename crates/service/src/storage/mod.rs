//! Record storage for player saves.
//!
//! One JSON document per username. Three operations mirror the three player
//! actions: `create` (register), `authenticate` (login) and `upsert` (save).
//! Writes to the same username are linearized; different usernames are
//! independent.

pub mod credential;
pub mod document;
pub mod file_store;
pub mod key;
pub mod locks;
pub mod memory_store;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

pub use document::RecordFields;
pub use file_store::FileRecordStore;
pub use key::RecordKey;
pub use memory_store::MemoryRecordStore;

/// Settings shared by every backend.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub fields: RecordFields,
    /// Indent persisted documents (file backend only).
    pub pretty: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { fields: RecordFields::default(), pretty: true }
    }
}

/// Keyed storage of one save document per username.
///
/// Implementations can be file-backed or in-memory; the HTTP layer only sees
/// this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reserved field names this store validates against.
    fn fields(&self) -> &RecordFields;

    /// Store `document` under `username` unless a record already exists.
    /// The existence check and the write are one atomic step per key.
    async fn create(&self, username: &str, document: Value) -> Result<Value, StoreError>;

    /// Return the stored document if `credential` matches its credential field.
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Value, StoreError>;

    /// Replace (or create) the whole record. No credential check.
    async fn upsert(&self, username: &str, document: Value) -> Result<Value, StoreError>;
}
