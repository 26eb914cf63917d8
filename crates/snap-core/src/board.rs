use std::sync::{Arc, RwLock};

use serde::Serialize;
use snap_store::{image_key, BlobStore, ItemStore, LocalStorage, StoreError};
use snap_types::{InventoryItem, ItemName, ItemRecord};
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::counter;
use crate::error::{BoardError, BoardResult};
use crate::likes::LikeLedger;
use crate::session::Session;

/// An image accompanying an add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    Created { record: ItemRecord },
    Incremented { count: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    Decremented { count: i64 },
    Missing,
}

/// Result of a like or dislike. The no-op variants mean nothing was written
/// locally or remotely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LikeOutcome {
    Liked { count: i64 },
    AlreadyLiked,
    Unliked { count: i64 },
    NotLiked,
}

impl LikeOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyLiked | Self::NotLiked)
    }
}

/// One device's view of the shared inventory board.
///
/// Holds the shared collaborators, this device's [`LikeLedger`] and the
/// list currently on display. Every mutation ends by re-reading the whole
/// collection, so once a call returns `Ok` the displayed list matches the
/// store. A failed remote write leaves any optimistic change in place
/// (the local like and the adjusted displayed count) and reports the error.
pub struct Board {
    items: Arc<dyn ItemStore>,
    blobs: Arc<dyn BlobStore>,
    likes: LikeLedger,
    config: BoardConfig,
    view: RwLock<Vec<InventoryItem>>,
}

impl Board {
    pub fn new(
        items: Arc<dyn ItemStore>,
        blobs: Arc<dyn BlobStore>,
        local: Arc<dyn LocalStorage>,
        config: BoardConfig,
    ) -> Self {
        Self {
            items,
            blobs,
            likes: LikeLedger::new(local),
            config,
            view: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// The list currently on display.
    pub fn inventory(&self) -> Vec<InventoryItem> {
        match self.view.read() {
            Ok(view) => view.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Re-read the whole collection and put it on display.
    pub async fn refresh(&self) -> BoardResult<Vec<InventoryItem>> {
        let items = self.items.list_all().await?;
        debug!(items = items.len(), "inventory refreshed");
        self.replace_view(items.clone());
        Ok(items)
    }

    pub fn has_liked(&self, name: &ItemName) -> BoardResult<bool> {
        self.likes.has_liked(name)
    }

    pub fn liked_items(&self) -> BoardResult<Vec<ItemName>> {
        self.likes.liked_items()
    }

    /// Post an item, or bump its count if the name is taken.
    ///
    /// Requires a signed-in user. The image (if any) is uploaded before the
    /// collection is touched; when the item already exists the new image is
    /// not attached to it.
    pub async fn add_item(
        &self,
        session: &Session,
        name: &ItemName,
        image: Option<ImageUpload>,
    ) -> BoardResult<AddOutcome> {
        let user = session.require_user("post items")?;

        let image_url = match image {
            Some(upload) => {
                let key = image_key(&upload.file_name)?;
                let handle = self.blobs.upload(&key, &upload.bytes).await?;
                self.blobs.public_url(&handle).await?
            }
            None => String::new(),
        };

        let record = ItemRecord::created_by(&user, image_url);
        let outcome = match counter::create_or_bump(&*self.items, name, &record, &self.config)
            .await?
        {
            None => {
                info!(item = %name, user = %user.id, "item created");
                AddOutcome::Created { record }
            }
            Some(count) => {
                info!(item = %name, count, "existing item bumped");
                AddOutcome::Incremented { count }
            }
        };

        self.refresh().await?;
        Ok(outcome)
    }

    /// Decrement an item's count. Absent items are left alone.
    pub async fn remove_item(&self, session: &Session, name: &ItemName) -> BoardResult<RemoveOutcome> {
        self.check_vote_allowed(session, "remove items")?;

        let outcome = match counter::adjust(&*self.items, name, -1, &self.config).await {
            Ok(count) => RemoveOutcome::Decremented { count },
            Err(StoreError::NotFound(_)) => {
                debug!(item = %name, "remove on missing item skipped");
                RemoveOutcome::Missing
            }
            Err(e) => return Err(e.into()),
        };

        self.refresh().await?;
        Ok(outcome)
    }

    /// Like an item from this device.
    ///
    /// A second like from the same device is a no-op. The local like is
    /// recorded before the shared counter is touched and is not undone if
    /// the counter update fails.
    pub async fn like(&self, session: &Session, name: &ItemName) -> BoardResult<LikeOutcome> {
        self.check_vote_allowed(session, "like items")?;

        if !self.likes.mark_liked(name)? {
            info!(item = %name, "already liked");
            return Ok(LikeOutcome::AlreadyLiked);
        }
        self.shift_displayed_count(name, 1);

        let count = self.push_count(name, 1).await?;
        self.refresh().await?;
        Ok(LikeOutcome::Liked { count })
    }

    /// Withdraw this device's like. A no-op unless the item is liked here.
    pub async fn dislike(&self, session: &Session, name: &ItemName) -> BoardResult<LikeOutcome> {
        self.check_vote_allowed(session, "dislike items")?;

        if !self.likes.clear_like(name)? {
            info!(item = %name, "not liked on this device");
            return Ok(LikeOutcome::NotLiked);
        }
        self.shift_displayed_count(name, -1);

        let count = self.push_count(name, -1).await?;
        self.refresh().await?;
        Ok(LikeOutcome::Unliked { count })
    }

    async fn push_count(&self, name: &ItemName, delta: i64) -> BoardResult<i64> {
        counter::adjust(&*self.items, name, delta, &self.config)
            .await
            .map_err(|e| {
                warn!(item = %name, delta, error = %e, "shared count update failed; local like state kept");
                BoardError::from(e)
            })
    }

    fn check_vote_allowed(&self, session: &Session, action: &'static str) -> BoardResult<()> {
        if self.config.require_auth_for_likes {
            session.require_user(action)?;
        }
        Ok(())
    }

    fn shift_displayed_count(&self, name: &ItemName, delta: i64) {
        let floor = self.config.floor();
        self.with_view(|view| {
            for item in view.iter_mut().filter(|i| &i.name == name) {
                let mut count = item.record.count.saturating_add(delta);
                if let Some(floor) = floor {
                    count = count.max(floor);
                }
                item.record.count = count;
            }
        });
    }

    fn replace_view(&self, items: Vec<InventoryItem>) {
        self.with_view(|view| *view = items);
    }

    fn with_view(&self, f: impl FnOnce(&mut Vec<InventoryItem>)) {
        match self.view.write() {
            Ok(mut view) => f(&mut *view),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("config", &self.config)
            .field("displayed_items", &self.inventory().len())
            .finish()
    }
}
