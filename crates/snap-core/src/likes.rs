//! The device's local like record.
//!
//! A JSON object mapping item name to `true`, stored under [`LIKES_KEY`] in
//! the device's [`LocalStorage`]. Unliking deletes the entry. The record is
//! re-read on every call so another writer on the same device (a second
//! window, say) is seen immediately. Changes hold the ledger's lock from load
//! to save, so concurrent likes through one ledger record at most one fresh
//! like.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use snap_store::LocalStorage;
use snap_types::ItemName;
use tracing::warn;

use crate::error::{BoardError, BoardResult};

/// Fixed storage key for the serialized like mapping.
pub const LIKES_KEY: &str = "userLikes";

type LikeMap = BTreeMap<String, bool>;

pub struct LikeLedger {
    storage: Arc<dyn LocalStorage>,
    write_lock: Mutex<()>,
}

impl LikeLedger {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> BoardResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| BoardError::LocalState(format!("like record lock poisoned: {e}")))
    }

    fn load(&self) -> BoardResult<LikeMap> {
        let raw = self
            .storage
            .get(LIKES_KEY)
            .map_err(|e| BoardError::LocalState(e.to_string()))?;
        match raw {
            None => Ok(LikeMap::new()),
            Some(text) => decode(&text),
        }
    }

    fn save(&self, likes: &LikeMap) -> BoardResult<()> {
        let text = encode(likes)?;
        self.storage
            .set(LIKES_KEY, &text)
            .map_err(|e| BoardError::LocalState(e.to_string()))
    }

    /// Whether this device has liked `name`. `false` when there is no record.
    pub fn has_liked(&self, name: &ItemName) -> BoardResult<bool> {
        Ok(self.load()?.get(name.as_str()).copied().unwrap_or(false))
    }

    /// Record a like. Returns `false` if it was already recorded.
    pub fn mark_liked(&self, name: &ItemName) -> BoardResult<bool> {
        let _guard = self.lock()?;
        let mut likes = self.load()?;
        if likes.get(name.as_str()).copied().unwrap_or(false) {
            return Ok(false);
        }
        likes.insert(name.as_str().to_string(), true);
        self.save(&likes)?;
        Ok(true)
    }

    /// Drop a like. Returns `false` if there was none.
    pub fn clear_like(&self, name: &ItemName) -> BoardResult<bool> {
        let _guard = self.lock()?;
        let mut likes = self.load()?;
        if likes.remove(name.as_str()) != Some(true) {
            return Ok(false);
        }
        self.save(&likes)?;
        Ok(true)
    }

    /// Every item this device currently likes, sorted by name.
    pub fn liked_items(&self) -> BoardResult<Vec<ItemName>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|(_, liked)| *liked)
            .filter_map(|(name, _)| match ItemName::new(name) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!(error = %e, "ignoring unusable entry in local like record");
                    None
                }
            })
            .collect())
    }
}

impl std::fmt::Debug for LikeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikeLedger").finish_non_exhaustive()
    }
}

fn encode(likes: &LikeMap) -> BoardResult<String> {
    serde_json::to_string(likes).map_err(|e| BoardError::LocalState(e.to_string()))
}

fn decode(text: &str) -> BoardResult<LikeMap> {
    serde_json::from_str(text).map_err(|e| BoardError::LocalState(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use snap_store::{FileLocalStorage, InMemoryLocalStorage};
    use std::collections::BTreeSet;
    use std::sync::Barrier;
    use std::thread;

    fn name(s: &str) -> ItemName {
        ItemName::new(s).unwrap()
    }

    fn ledger() -> (Arc<InMemoryLocalStorage>, LikeLedger) {
        let storage = Arc::new(InMemoryLocalStorage::new());
        let ledger = LikeLedger::new(storage.clone());
        (storage, ledger)
    }

    #[test]
    fn nothing_is_liked_initially() {
        let (_, ledger) = ledger();
        assert!(!ledger.has_liked(&name("Apple")).unwrap());
        assert!(ledger.liked_items().unwrap().is_empty());
    }

    #[test]
    fn mark_and_clear() {
        let (storage, ledger) = ledger();
        assert!(ledger.mark_liked(&name("Apple")).unwrap());
        assert!(!ledger.mark_liked(&name("Apple")).unwrap());
        assert!(ledger.has_liked(&name("Apple")).unwrap());
        assert_eq!(
            storage.get(LIKES_KEY).unwrap().as_deref(),
            Some(r#"{"Apple":true}"#)
        );

        assert!(ledger.clear_like(&name("Apple")).unwrap());
        assert!(!ledger.clear_like(&name("Apple")).unwrap());
        assert!(!ledger.has_liked(&name("Apple")).unwrap());
        assert_eq!(storage.get(LIKES_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn false_entries_count_as_not_liked() {
        let (storage, ledger) = ledger();
        storage.set(LIKES_KEY, r#"{"Apple":false,"Pear":true}"#).unwrap();
        assert!(!ledger.has_liked(&name("Apple")).unwrap());
        assert_eq!(ledger.liked_items().unwrap(), vec![name("Pear")]);
        assert!(!ledger.clear_like(&name("Apple")).unwrap());
        assert!(ledger.mark_liked(&name("Apple")).unwrap());
    }

    #[test]
    fn corrupt_record_is_reported() {
        let (storage, ledger) = ledger();
        storage.set(LIKES_KEY, "[1,2").unwrap();
        assert!(matches!(
            ledger.has_liked(&name("Apple")),
            Err(BoardError::LocalState(_))
        ));
    }

    #[test]
    fn empty_name_entries_are_skipped() {
        let (storage, ledger) = ledger();
        storage.set(LIKES_KEY, r#"{"":true,"Fig":true}"#).unwrap();
        assert_eq!(ledger.liked_items().unwrap(), vec![name("Fig")]);
    }

    #[test]
    fn survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        LikeLedger::new(Arc::new(FileLocalStorage::new(&path)))
            .mark_liked(&name("Apple"))
            .unwrap();
        let reloaded = LikeLedger::new(Arc::new(FileLocalStorage::new(&path)));
        assert!(reloaded.has_liked(&name("Apple")).unwrap());
    }

    #[test]
    fn concurrent_marks_record_one_fresh_like() {
        const THREADS: usize = 8;
        let dir = tempfile::tempdir().unwrap();
        for round in 0..50 {
            let path = dir.path().join(format!("device-{round}.json"));
            let ledger = Arc::new(LikeLedger::new(Arc::new(FileLocalStorage::new(&path))));
            let barrier = Arc::new(Barrier::new(THREADS));
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let ledger = ledger.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        ledger.mark_liked(&name("Apple")).unwrap()
                    })
                })
                .collect();
            let fresh = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|fresh| *fresh)
                .count();
            assert_eq!(fresh, 1, "round {round}");
        }
    }

    #[test]
    fn concurrent_clears_remove_one_like() {
        const THREADS: usize = 8;
        let (_, ledger) = ledger();
        let ledger = Arc::new(ledger);
        ledger.mark_liked(&name("Apple")).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let ledger = ledger.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    ledger.clear_like(&name("Apple")).unwrap()
                })
            })
            .collect();
        let cleared = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|cleared| *cleared)
            .count();
        assert_eq!(cleared, 1);
        assert!(!ledger.has_liked(&name("Apple")).unwrap());
    }

    proptest! {
        #[test]
        fn persisted_likes_reload_as_the_same_set(
            names in prop::collection::btree_set("[A-Za-z0-9 ]{1,12}", 0..12)
        ) {
            let storage = Arc::new(InMemoryLocalStorage::new());
            let writer = LikeLedger::new(storage.clone());
            for n in &names {
                writer.mark_liked(&name(n)).unwrap();
            }
            let reader = LikeLedger::new(storage);
            let reloaded: BTreeSet<String> = reader
                .liked_items()
                .unwrap()
                .into_iter()
                .map(ItemName::into_string)
                .collect();
            prop_assert_eq!(reloaded, names);
        }
    }
}
