//! Storage collaborators for SnapShare.
//!
//! The board never talks to a concrete backend. It goes through three
//! traits, one per external collaborator:
//!
//! - [`ItemStore`] -- the shared item collection, one record per item name
//! - [`BlobStore`] -- uploaded images, addressed by `/`-separated keys
//! - [`LocalStorage`] -- device-scoped string key/value storage
//!
//! # Backends
//!
//! - [`InMemoryItemStore`], [`InMemoryBlobStore`], [`InMemoryLocalStorage`]
//!   -- `RwLock`-guarded maps for tests, embedding, and the HTTP host
//! - [`FileItemStore`], [`FileBlobStore`], [`FileLocalStorage`]
//!   -- JSON documents and plain files under a data directory
//!
//! # Design Rules
//!
//! 1. Item records are never deleted; a remove is a count decrement.
//! 2. `update` on an absent item fails with [`StoreError::NotFound`].
//! 3. `increment` and `insert_if_absent` are atomic with respect to every
//!    other call on the same store value.
//! 4. Locks are never held across an `.await`.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use blob::{image_key, validate_blob_key, BlobHandle};
pub use error::{StoreError, StoreResult};
pub use file::{FileBlobStore, FileItemStore, FileLocalStorage};
pub use memory::{InMemoryBlobStore, InMemoryItemStore, InMemoryLocalStorage};
pub use traits::{BlobStore, ItemStore, LocalStorage};
