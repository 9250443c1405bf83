use std::{io::{ErrorKind, Write}, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::{document::RecordFields, key::RecordKey, locks::{KeyGuard, KeyLocks}, RecordStore, StoreOptions};
use crate::errors::StoreError;

/// File-backed record store: `<root>/<username>.json`, one document per player.
///
/// Every write lands in a hidden temp file next to the target and is renamed
/// over it, so readers see either the previous document or the new one. Once
/// a write has the key lock it runs to completion even if the request goes
/// away; a failed write removes its temp file.
pub struct FileRecordStore {
    root: PathBuf,
    options: StoreOptions,
    locks: KeyLocks,
}

impl FileRecordStore {
    /// Open the store rooted at `root`, creating the directory if missing and
    /// removing temp files left behind by an interrupted process.
    pub async fn open<P: Into<PathBuf>>(root: P, options: StoreOptions) -> Result<Arc<Self>, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::storage("create storage root", e))?;
        let store = Self { root, options, locks: KeyLocks::new() };
        store.sweep_temp_files().await?;
        Ok(Arc::new(store))
    }

    pub fn root(&self) -> &Path { &self.root }

    fn path_for(&self, key: &RecordKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    async fn sweep_temp_files(&self) -> Result<(), StoreError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::storage("list storage root", e))?;
        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::storage("list storage root", e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.')
                && name.ends_with(".tmp")
                && fs::remove_file(entry.path()).await.is_ok()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            warn!(root = %self.root.display(), removed, "removed stale temp files");
        }
        Ok(())
    }

    /// `Ok(None)` only when the file does not exist; anything unreadable is a
    /// storage failure rather than a missing player.
    async fn read(&self, key: &RecordKey) -> Result<Option<Value>, StoreError> {
        let bytes = match fs::read(self.path_for(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::storage("read record", e)),
        };
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::storage(&format!("corrupt record {key}"), e))?;
        if !doc.is_object() {
            return Err(StoreError::Storage(format!("corrupt record {key}: not a JSON object")));
        }
        Ok(Some(doc))
    }

    async fn exists(&self, key: &RecordKey) -> Result<bool, StoreError> {
        fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| StoreError::storage("check record", e))
    }

    /// Persist `doc` while holding `guard`.
    ///
    /// The temp write, rename and directory sync run on a blocking thread that
    /// owns the guard, so a caller dropping this future neither abandons a temp
    /// file nor lets the next writer for the key overtake this one.
    async fn write(&self, key: &RecordKey, doc: &Value, guard: KeyGuard) -> Result<(), StoreError> {
        let mut data = if self.options.pretty {
            serde_json::to_vec_pretty(doc)
        } else {
            serde_json::to_vec(doc)
        }
        .map_err(|e| StoreError::storage("serialize record", e))?;
        data.push(b'\n');

        let root = self.root.clone();
        let target = self.path_for(key);
        let tmp = root.join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            write_atomic(&root, &tmp, &target, &data)
        })
        .await
        .map_err(|e| StoreError::storage("join write task", e))?
        .map_err(|e| StoreError::storage("write record", e))
    }
}

/// Temp file removed on drop unless it was renamed into place.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    fn new(path: &Path) -> Self { Self { path: path.to_path_buf(), armed: true } }

    fn persisted(mut self) { self.armed = false; }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn write_atomic(root: &Path, tmp: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    let pending = TempFile::new(tmp);
    let mut file = std::fs::File::create(tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp, target)?;
    pending.persisted();
    // 刷新目录项，保证 rename 本身落盘
    sync_dir(root)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl RecordStore for FileRecordStore {
    fn fields(&self) -> &RecordFields { &self.options.fields }

    #[instrument(skip(self, document), fields(backend = "file"))]
    async fn create(&self, username: &str, document: Value) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        self.options.fields.check_new(&key, &document)?;

        let guard = self.locks.lock(&key).await;
        if self.exists(&key).await? {
            debug!("record already exists");
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        self.write(&key, &document, guard).await?;
        debug!("record created");
        Ok(document)
    }

    #[instrument(skip(self, credential), fields(backend = "file"))]
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        if credential.is_empty() {
            return Err(StoreError::invalid(format!("{} must not be empty", self.options.fields.credential)));
        }
        // rename is atomic, so readers need no lock
        let doc = self
            .read(&key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        self.options.fields.authorize(&doc, credential)?;
        Ok(doc)
    }

    #[instrument(skip(self, document), fields(backend = "file"))]
    async fn upsert(&self, username: &str, document: Value) -> Result<Value, StoreError> {
        let key = RecordKey::parse(username)?;
        self.options.fields.check_identity(&key, &document)?;

        let guard = self.locks.lock(&key).await;
        self.write(&key, &document, guard).await?;
        debug!("record replaced");
        Ok(document)
    }
}
