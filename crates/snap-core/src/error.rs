use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("you must be signed in to {action}")]
    NotAuthenticated { action: &'static str },

    #[error("invalid input: {0}")]
    InvalidName(#[from] snap_types::TypeError),

    /// A call to the shared item store or blob store failed. Any optimistic
    /// local change made before the call is left in place.
    #[error("remote store error: {0}")]
    Remote(#[from] snap_store::StoreError),

    #[error("local like record unusable: {0}")]
    LocalState(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type BoardResult<T> = Result<T, BoardError>;
