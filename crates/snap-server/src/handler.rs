use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use snap_core::{AddOutcome, BoardError, ImageUpload, LikeOutcome, RemoveOutcome};
use snap_store::StoreError;
use snap_types::{DeviceId, InventoryItem, ItemName};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub const DEVICE_HEADER: &str = "x-device-id";
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "snap-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_items(State(state): State<AppState>) -> ServerResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.items().list_all().await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<AddOutcome>)> {
    let session = state.identity().session(&headers).await?;
    let name = parse_name(name)?;
    let image = if body.is_empty() {
        None
    } else {
        let file_name = header_str(&headers, FILE_NAME_HEADER)?
            .ok_or(ServerError::MissingHeader(FILE_NAME_HEADER))?;
        Some(ImageUpload::new(file_name, body.to_vec()))
    };

    let outcome = state.host_board().add_item(&session, &name, image).await?;
    let status = match outcome {
        AddOutcome::Created { .. } => StatusCode::CREATED,
        AddOutcome::Incremented { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<RemoveOutcome>> {
    let session = state.identity().session(&headers).await?;
    let name = parse_name(name)?;
    Ok(Json(state.host_board().remove_item(&session, &name).await?))
}

pub async fn like_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<LikeOutcome>> {
    let session = state.identity().session(&headers).await?;
    let name = parse_name(name)?;
    let device = device_from(&headers)?;
    let _vote = state.lock_device(&device).await;
    let board = state.device_board(&device)?;
    Ok(Json(board.like(&session, &name).await?))
}

pub async fn dislike_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Json<LikeOutcome>> {
    let session = state.identity().session(&headers).await?;
    let name = parse_name(name)?;
    let device = device_from(&headers)?;
    let _vote = state.lock_device(&device).await;
    let board = state.device_board(&device)?;
    Ok(Json(board.dislike(&session, &name).await?))
}

pub async fn device_likes(
    State(state): State<AppState>,
    Path(device): Path<String>,
) -> ServerResult<Json<Vec<ItemName>>> {
    let device = DeviceId::new(device).map_err(|e| ServerError::InvalidHeader {
        header: DEVICE_HEADER,
        reason: e.to_string(),
    })?;
    let board = state.device_board(&device)?;
    Ok(Json(board.liked_items()?))
}

pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Response> {
    let bytes = state
        .blobs()
        .download(&key)
        .await?
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;
    Ok(([(CONTENT_TYPE, content_type_for(&key))], bytes).into_response())
}

fn parse_name(raw: String) -> ServerResult<ItemName> {
    ItemName::new(raw).map_err(|e| ServerError::Board(BoardError::InvalidName(e)))
}

fn header_str(headers: &HeaderMap, header: &'static str) -> ServerResult<Option<String>> {
    headers
        .get(header)
        .map(|v| {
            v.to_str()
                .map(str::to_string)
                .map_err(|_| ServerError::InvalidHeader {
                    header,
                    reason: "not valid ASCII".into(),
                })
        })
        .transpose()
}

fn device_from(headers: &HeaderMap) -> ServerResult<DeviceId> {
    let raw = header_str(headers, DEVICE_HEADER)?.ok_or(ServerError::MissingHeader(DEVICE_HEADER))?;
    DeviceId::new(raw).map_err(|e| ServerError::InvalidHeader {
        header: DEVICE_HEADER,
        reason: e.to_string(),
    })
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
