//! File-backed collaborators.
//!
//! Used by the command-line board, where the "hosted" collection is a data
//! directory on disk. Documents are rewritten whole through a temp file in
//! the same directory followed by a rename, so a crash never leaves a
//! half-written document behind.
//!
//! Atomic operations are atomic within one process only: two processes
//! sharing a data directory can still lose updates.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snap_types::{InventoryItem, ItemName, ItemPatch, ItemRecord};
use tracing::debug;

use crate::blob::{validate_blob_key, BlobHandle};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobStore, ItemStore, LocalStorage};

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn lock_failed(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

/// Item collection kept as one JSON object `{name: record}` on disk.
///
/// Every call runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FileItemStore {
    doc: Arc<ItemDocument>,
}

#[derive(Debug)]
struct ItemDocument {
    path: PathBuf,
    lock: Mutex<()>,
}

type ItemMap = BTreeMap<ItemName, ItemRecord>;

impl ItemDocument {
    fn load(&self) -> StoreResult<ItemMap> {
        read_json_or_default(&self.path)
    }

    fn read(&self) -> StoreResult<ItemMap> {
        let _guard = self.lock.lock().map_err(lock_failed)?;
        self.load()
    }

    /// Load, mutate and save under the document lock.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut ItemMap) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let _guard = self.lock.lock().map_err(lock_failed)?;
        let mut items = self.load()?;
        let (out, dirty) = f(&mut items)?;
        if dirty {
            write_json_atomic(&self.path, &items)?;
            debug!(path = %self.path.display(), items = items.len(), "item collection written");
        }
        Ok(out)
    }
}

impl FileItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: Arc::new(ItemDocument {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.doc.path
    }

    async fn blocking<T: Send + 'static>(
        &self,
        f: impl FnOnce(&ItemDocument) -> StoreResult<T> + Send + 'static,
    ) -> StoreResult<T> {
        let doc = self.doc.clone();
        tokio::task::spawn_blocking(move || f(&doc))
            .await
            .map_err(|e| StoreError::Unavailable(format!("file task failed: {e}")))?
    }
}

#[async_trait]
impl ItemStore for FileItemStore {
    async fn get(&self, name: &ItemName) -> StoreResult<Option<ItemRecord>> {
        let name = name.clone();
        self.blocking(move |doc| Ok(doc.read()?.remove(&name))).await
    }

    async fn put(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<()> {
        let (name, record) = (name.clone(), record.clone());
        self.blocking(move |doc| {
            doc.modify(|items| {
                items.insert(name, record);
                Ok(((), true))
            })
        })
        .await
    }

    async fn update(&self, name: &ItemName, patch: &ItemPatch) -> StoreResult<()> {
        let (name, patch) = (name.clone(), patch.clone());
        self.blocking(move |doc| {
            doc.modify(|items| {
                let record = items
                    .get_mut(&name)
                    .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
                record.apply(&patch);
                Ok(((), true))
            })
        })
        .await
    }

    async fn list_all(&self) -> StoreResult<Vec<InventoryItem>> {
        self.blocking(|doc| {
            Ok(doc
                .read()?
                .into_iter()
                .map(|(name, record)| InventoryItem::new(name, record))
                .collect())
        })
        .await
    }

    async fn increment(
        &self,
        name: &ItemName,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<i64> {
        let name = name.clone();
        self.blocking(move |doc| {
            doc.modify(|items| {
                let record = items
                    .get_mut(&name)
                    .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
                let mut count = record.count.saturating_add(delta);
                if let Some(floor) = floor {
                    count = count.max(floor);
                }
                record.count = count;
                Ok((count, true))
            })
        })
        .await
    }

    async fn insert_if_absent(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<bool> {
        let (name, record) = (name.clone(), record.clone());
        self.blocking(move |doc| {
            doc.modify(|items| {
                if items.contains_key(&name) {
                    return Ok((false, false));
                }
                items.insert(name, record);
                Ok((true, true))
            })
        })
        .await
    }
}

/// Blobs stored as plain files under a root directory.
///
/// Public URLs are `file://` URLs of the stored file unless a base URL is
/// set, in which case they are `<base_url>/<key>`.
#[derive(Debug)]
pub struct FileBlobStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// Serve public URLs from `base_url` (e.g. an HTTP blob route).
    pub fn with_base_url(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
        }
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_blob_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8]) -> StoreResult<BlobHandle> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, bytes = bytes.len(), "blob uploaded");
        Ok(BlobHandle::new(key))
    }

    async fn public_url(&self, handle: &BlobHandle) -> StoreResult<String> {
        let path = self.path_for(handle.key())?;
        if let Some(base) = &self.base_url {
            if !tokio::fs::try_exists(&path).await? {
                return Err(StoreError::NotFound(handle.key().to_string()));
            }
            return Ok(format!("{base}/{}", handle.key()));
        }
        let absolute = tokio::fs::canonicalize(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(handle.key().to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(format!("file://{}", absolute.display()))
    }

    async fn download(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Device storage kept as one JSON object of string values.
#[derive(Debug)]
pub struct FileLocalStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStorage for FileLocalStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().map_err(lock_failed)?;
        let mut entries: HashMap<String, String> = read_json_or_default(&self.path)?;
        Ok(entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(lock_failed)?;
        let mut entries: BTreeMap<String, String> = read_json_or_default(&self.path)?;
        entries.insert(key.to_string(), value.to_string());
        write_json_atomic(&self.path, &entries)
    }
}
