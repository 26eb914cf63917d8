//! Shared counter updates, in either [`CounterMode`].

use snap_store::{ItemStore, StoreError, StoreResult};
use snap_types::{ItemName, ItemPatch, ItemRecord};
use tracing::debug;

use crate::config::{BoardConfig, CounterMode};

/// Add `delta` to the shared count of `name` and return the stored value.
///
/// Fails with `NotFound` when the item does not exist.
pub async fn adjust(
    items: &dyn ItemStore,
    name: &ItemName,
    delta: i64,
    config: &BoardConfig,
) -> StoreResult<i64> {
    let floor = config.floor();
    match config.counter_mode {
        CounterMode::Atomic => items.increment(name, delta, floor).await,
        CounterMode::ReadModifyWrite => {
            let current = items
                .get(name)
                .await?
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
            let mut next = current.count.saturating_add(delta);
            if let Some(floor) = floor {
                next = next.max(floor);
            }
            items.update(name, &ItemPatch::count(next)).await?;
            debug!(item = %name, from = current.count, to = next, "count rewritten");
            Ok(next)
        }
    }
}

/// Create `name` with `record`, or bump its count by one if it exists.
///
/// Returns `None` when the record was created, otherwise the new count.
pub async fn create_or_bump(
    items: &dyn ItemStore,
    name: &ItemName,
    record: &ItemRecord,
    config: &BoardConfig,
) -> StoreResult<Option<i64>> {
    match config.counter_mode {
        CounterMode::Atomic => {
            if items.insert_if_absent(name, record).await? {
                return Ok(None);
            }
            items.increment(name, 1, None).await.map(Some)
        }
        CounterMode::ReadModifyWrite => match items.get(name).await? {
            Some(existing) => {
                let next = existing.count.saturating_add(1);
                items.update(name, &ItemPatch::count(next)).await?;
                Ok(Some(next))
            }
            None => {
                items.put(name, record).await?;
                Ok(None)
            }
        },
    }
}
