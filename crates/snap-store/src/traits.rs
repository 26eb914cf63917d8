use async_trait::async_trait;
use snap_types::{InventoryItem, ItemName, ItemPatch, ItemRecord};

use crate::blob::BlobHandle;
use crate::error::StoreResult;

/// The shared item collection.
///
/// One record per item name. Implementations must satisfy:
/// - `get` returns `Ok(None)` for an unknown name, never an error.
/// - `put` creates or overwrites the whole record.
/// - `update` merges a patch into an existing record and fails with
///   `NotFound` when the record is absent.
/// - `list_all` returns every record, sorted by name.
/// - `increment` and `insert_if_absent` are atomic: no other call on the
///   same store can observe or overwrite an intermediate state.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, name: &ItemName) -> StoreResult<Option<ItemRecord>>;

    async fn put(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<()>;

    async fn update(&self, name: &ItemName, patch: &ItemPatch) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<InventoryItem>>;

    /// Add `delta` to the stored count and return the new value.
    ///
    /// When `floor` is set the result never drops below it. Fails with
    /// `NotFound` when the record is absent.
    async fn increment(&self, name: &ItemName, delta: i64, floor: Option<i64>)
        -> StoreResult<i64>;

    /// Create the record unless one already exists.
    ///
    /// Returns `true` if this call created it.
    async fn insert_if_absent(&self, name: &ItemName, record: &ItemRecord) -> StoreResult<bool>;
}

/// Object storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous blob at that key.
    async fn upload(&self, key: &str, bytes: &[u8]) -> StoreResult<BlobHandle>;

    /// A URL from which the blob can be fetched by anyone.
    async fn public_url(&self, handle: &BlobHandle) -> StoreResult<String>;

    /// Read a blob back. `Ok(None)` when nothing is stored at `key`.
    async fn download(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
}

/// Device-scoped string storage.
///
/// Not synced across devices and not tied to the signed-in user.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}
