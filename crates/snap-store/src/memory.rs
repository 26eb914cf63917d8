use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use snap_types::{InventoryItem, ItemName, ItemPatch, ItemRecord};

use crate::blob::{validate_blob_key, BlobHandle};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobStore, ItemStore, LocalStorage};

fn poisoned(e: impl Display) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

/// In-memory, `BTreeMap`-based item store.
///
/// Intended for tests and for the HTTP host. Records are cloned on
/// read/write. Writes can be switched off with [`deny_writes`] to model a
/// backend that rejects mutations.
///
/// [`deny_writes`]: InMemoryItemStore::deny_writes
pub struct InMemoryItemStore {
    items: RwLock<BTreeMap<ItemName, ItemRecord>>,
    writes_denied: AtomicBool,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            writes_denied: AtomicBool::new(false),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.items.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent mutation fail with `PermissionDenied`.
    pub fn deny_writes(&self, denied: bool) {
        self.writes_denied.store(denied, Ordering::SeqCst);
    }

    fn check_writable(&self, name: &ItemName) -> StoreResult<()> {
        if self.writes_denied.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(format!("write to {name}")));
        }
        Ok(())
    }
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get(&self, name: &ItemName) -> StoreResult<Option<ItemRecord>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(name).cloned())
    }

    async fn put(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<()> {
        self.check_writable(name)?;
        let mut items = self.items.write().map_err(poisoned)?;
        items.insert(name.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, name: &ItemName, patch: &ItemPatch) -> StoreResult<()> {
        self.check_writable(name)?;
        let mut items = self.items.write().map_err(poisoned)?;
        let record = items
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        record.apply(patch);
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<InventoryItem>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items
            .iter()
            .map(|(name, record)| InventoryItem::new(name.clone(), record.clone()))
            .collect())
    }

    async fn increment(
        &self,
        name: &ItemName,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<i64> {
        self.check_writable(name)?;
        let mut items = self.items.write().map_err(poisoned)?;
        let record = items
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let mut count = record.count.saturating_add(delta);
        if let Some(floor) = floor {
            count = count.max(floor);
        }
        record.count = count;
        Ok(count)
    }

    async fn insert_if_absent(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<bool> {
        self.check_writable(name)?;
        let mut items = self.items.write().map_err(poisoned)?;
        if items.contains_key(name) {
            return Ok(false);
        }
        items.insert(name.clone(), record.clone());
        Ok(true)
    }
}

impl std::fmt::Debug for InMemoryItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryItemStore")
            .field("item_count", &self.len())
            .field("writes_denied", &self.writes_denied.load(Ordering::SeqCst))
            .finish()
    }
}

/// In-memory blob store.
///
/// Public URLs are `<base_url>/<key>`; the HTTP host points `base_url` at
/// its own blob route.
#[derive(Debug)]
pub struct InMemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8]) -> StoreResult<BlobHandle> {
        validate_blob_key(key)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(BlobHandle::new(key))
    }

    async fn public_url(&self, handle: &BlobHandle) -> StoreResult<String> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        if !blobs.contains_key(handle.key()) {
            return Err(StoreError::NotFound(handle.key().to_string()));
        }
        Ok(format!("{}/{}", self.base_url, handle.key()))
    }

    async fn download(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_blob_key(key)?;
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs.get(key).cloned())
    }
}

/// In-memory device storage. Lost when dropped.
#[derive(Debug, Default)]
pub struct InMemoryLocalStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snap_types::UserProfile;

    fn name(s: &str) -> ItemName {
        ItemName::new(s).unwrap()
    }

    fn record(count: i64) -> ItemRecord {
        ItemRecord {
            count,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Item store
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryItemStore::new();
        let uploader = UserProfile::new("u-1", "alice");
        let rec = ItemRecord::created_by(&uploader, "");
        store.put(&name("Apple"), &rec).await.unwrap();
        assert_eq!(store.get(&name("Apple")).await.unwrap(), Some(rec));
        assert!(store.get(&name("Pear")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryItemStore::new();
        let err = store
            .update(&name("Ghost"), &ItemPatch::count(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let store = InMemoryItemStore::new();
        let uploader = UserProfile::new("u-1", "alice");
        store
            .put(&name("Apple"), &ItemRecord::created_by(&uploader, "url"))
            .await
            .unwrap();
        store
            .update(&name("Apple"), &ItemPatch::count(9))
            .await
            .unwrap();
        let rec = store.get(&name("Apple")).await.unwrap().unwrap();
        assert_eq!(rec.count, 9);
        assert_eq!(rec.image_url, "url");
        assert_eq!(rec.uploader_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn list_all_is_sorted() {
        let store = InMemoryItemStore::new();
        for n in ["Cherry", "Apple", "Banana"] {
            store.put(&name(n), &record(1)).await.unwrap();
        }
        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name.into_string())
            .collect();
        assert_eq!(names, vec!["Apple", "Banana", "Cherry"]);
    }

    #[tokio::test]
    async fn increment_respects_floor() {
        let store = InMemoryItemStore::new();
        store.put(&name("Apple"), &record(0)).await.unwrap();
        assert_eq!(store.increment(&name("Apple"), -1, None).await.unwrap(), -1);
        assert_eq!(store.increment(&name("Apple"), -1, Some(0)).await.unwrap(), 0);
        assert_eq!(store.increment(&name("Apple"), 2, Some(0)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn increment_missing_is_not_found() {
        let store = InMemoryItemStore::new();
        assert!(matches!(
            store.increment(&name("Ghost"), 1, None).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_if_absent_only_creates_once() {
        let store = InMemoryItemStore::new();
        assert!(store.insert_if_absent(&name("Apple"), &record(1)).await.unwrap());
        assert!(!store.insert_if_absent(&name("Apple"), &record(5)).await.unwrap());
        assert_eq!(store.get(&name("Apple")).await.unwrap().unwrap().count, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn denied_writes_fail_but_reads_work() {
        let store = InMemoryItemStore::new();
        store.put(&name("Apple"), &record(1)).await.unwrap();
        store.deny_writes(true);
        assert!(matches!(
            store.increment(&name("Apple"), 1, None).await,
            Err(StoreError::PermissionDenied(_))
        ));
        assert!(matches!(
            store.put(&name("Pear"), &record(1)).await,
            Err(StoreError::PermissionDenied(_))
        ));
        assert_eq!(store.get(&name("Apple")).await.unwrap().unwrap().count, 1);
        store.deny_writes(false);
        assert_eq!(store.increment(&name("Apple"), 1, None).await.unwrap(), 2);
    }

    // -----------------------------------------------------------------------
    // Blob store
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn upload_and_public_url() {
        let blobs = InMemoryBlobStore::new("http://localhost:8080/v1/blobs/");
        let handle = blobs.upload("images/a.png", b"png").await.unwrap();
        assert_eq!(
            blobs.public_url(&handle).await.unwrap(),
            "http://localhost:8080/v1/blobs/images/a.png"
        );
        assert_eq!(
            blobs.download("images/a.png").await.unwrap(),
            Some(b"png".to_vec())
        );
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn upload_rejects_bad_keys() {
        let blobs = InMemoryBlobStore::new("http://x");
        assert!(matches!(
            blobs.upload("../a", b"").await,
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn public_url_of_unknown_blob_fails() {
        let blobs = InMemoryBlobStore::new("http://x");
        let handle = BlobHandle::new("images/missing.png");
        assert!(matches!(
            blobs.public_url(&handle).await,
            Err(StoreError::NotFound(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Local storage
    // -----------------------------------------------------------------------

    #[test]
    fn local_storage_set_and_get() {
        let local = InMemoryLocalStorage::new();
        assert!(local.get("userLikes").unwrap().is_none());
        local.set("userLikes", "{}").unwrap();
        assert_eq!(local.get("userLikes").unwrap().as_deref(), Some("{}"));
    }
}
