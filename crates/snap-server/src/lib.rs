//! HTTP host for SnapShare.
//!
//! Plays the hosted backend for browser-less clients: it owns the shared
//! item collection and the image blobs, and keeps one [`Board`] per device
//! (selected by the `x-device-id` header) so each device has its own like
//! record.
//!
//! [`Board`]: snap_core::Board

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Credentials, HeaderIdentity, RequestIdentity};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::SnapServer;
pub use state::AppState;
