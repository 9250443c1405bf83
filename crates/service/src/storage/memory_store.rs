use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{document::RecordFields, key::RecordKey, RecordStore, StoreOptions};
use crate::errors::StoreError;

/// In-process record store. Nothing is persisted; used by tests and by
/// `storage.backend = "memory"` for throwaway servers.
///
/// The map's entry API gives create-if-absent atomically per key, so no
/// separate lock table is needed.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, Value>,
    fields: RecordFields,
}

impl MemoryRecordStore {
    pub fn new(options: StoreOptions) -> Arc<Self> {
        Arc::new(Self { records: DashMap::new(), fields: options.fields })
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn fields(&self) -> &RecordFields { &self.fields }

    #[instrument(skip(self, document), fields(backend = "memory"))]
    async fn create(&self, username: &str, document: Value) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        self.fields.check_new(&key, &document)?;
        match self.records.entry(key.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                debug!("record created");
                Ok(document)
            }
        }
    }

    #[instrument(skip(self, credential), fields(backend = "memory"))]
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        if credential.is_empty() {
            return Err(StoreError::invalid(format!("{} must not be empty", self.fields.credential)));
        }
        let doc = self
            .records
            .get(key.as_str())
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        self.fields.authorize(&doc, credential)?;
        Ok(doc)
    }

    #[instrument(skip(self, document), fields(backend = "memory"))]
    async fn upsert(&self, username: &str, document: Value) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        self.fields.check_identity(&key, &document)?;
        self.records.insert(key.as_str().to_owned(), document.clone());
        debug!("record replaced");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;

    macro_rules! conformance_test {
        ($name:ident) => {
            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn $name() {
                conformance::$name(MemoryRecordStore::new(StoreOptions::default())).await;
            }
        };
    }

    conformance_test!(create_then_authenticate);
    conformance_test!(duplicate_create_keeps_first);
    conformance_test!(wrong_credential_and_missing_user);
    conformance_test!(upsert_replaces_whole_record);
    conformance_test!(rejects_bad_input);
    conformance_test!(empty_credential_is_accepted_on_create);
    conformance_test!(concurrent_creates_single_winner);
    conformance_test!(concurrent_upserts_never_interleave);
    conformance_test!(reads_during_upserts_see_whole_documents);

    #[tokio::test]
    async fn failed_create_does_not_insert() {
        let store = MemoryRecordStore::new(StoreOptions::default());
        assert!(store.create("ann", serde_json::json!({"money": 1})).await.is_err());
        assert!(store.is_empty());
        store.create("ann", serde_json::json!({"credential": "a"})).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
