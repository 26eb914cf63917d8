//! Foundation types for SnapShare.
//!
//! Every other SnapShare crate depends on `snap-types`.
//!
//! # Key Types
//!
//! - [`ItemName`]: Non-empty item name, also the storage key of the item
//! - [`ItemRecord`]: Stored shape of one item: shared count, image URL, uploader
//! - [`ItemPatch`]: Partial update applied to an existing record
//! - [`InventoryItem`]: A record paired with its name, as listed on the board
//! - [`UserProfile`]: Identity handed out by the identity provider
//! - [`DeviceId`]: Identifier of the device that owns a local like record

pub mod error;
pub mod identity;
pub mod item;

pub use error::TypeError;
pub use identity::{DeviceId, UserProfile};
pub use item::{InventoryItem, ItemName, ItemPatch, ItemRecord};
