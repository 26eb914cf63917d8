use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use snap_core::BoardError;
use snap_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid header {header}: {reason}")]
    InvalidHeader { header: &'static str, reason: String },

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::InvalidHeader { .. } => StatusCode::BAD_REQUEST,
            Self::Board(e) => match e {
                BoardError::NotAuthenticated { .. } => StatusCode::UNAUTHORIZED,
                BoardError::InvalidName(_) => StatusCode::BAD_REQUEST,
                BoardError::Remote(store) => store_status(store),
                BoardError::LocalState(_) | BoardError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Store(e) => store_status(e),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidKey { .. } => StatusCode::BAD_REQUEST,
        StoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Serialization(_) | StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use snap_types::TypeError;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::from(BoardError::NotAuthenticated { action: "post items" }).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::from(BoardError::InvalidName(TypeError::EmptyItemName)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(BoardError::Remote(StoreError::NotFound("x".into()))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::MissingHeader("x-device-id").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
