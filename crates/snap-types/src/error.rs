use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("item name must not be empty")]
    EmptyItemName,

    #[error("invalid device id {id:?}: {reason}")]
    InvalidDeviceId { id: String, reason: String },
}
