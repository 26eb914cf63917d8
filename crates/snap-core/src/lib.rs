//! Like reconciliation and the board facade for SnapShare.
//!
//! A device tracks which items it has liked in its own local storage
//! ([`LikeLedger`]); the shared per-item counter lives in an
//! [`ItemStore`](snap_store::ItemStore). [`Board`] keeps the two in step:
//! a like is recorded locally first, then pushed to the shared counter,
//! then the whole collection is re-read so the displayed list matches the
//! store.
//!
//! Every board operation takes an explicit [`Session`] naming the signed-in
//! user (if any). Nothing reads user state from globals.

pub mod board;
pub mod config;
pub mod counter;
pub mod error;
pub mod likes;
pub mod session;

pub use board::{AddOutcome, Board, ImageUpload, LikeOutcome, RemoveOutcome};
pub use config::{BoardConfig, CounterMode};
pub use error::{BoardError, BoardResult};
pub use likes::{LikeLedger, LIKES_KEY};
pub use session::{IdentityProvider, LocalIdentity, Session};

pub use snap_types::{DeviceId, InventoryItem, ItemName, ItemRecord, UserProfile};
