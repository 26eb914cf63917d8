use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all SnapShare endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().max_image_bytes;
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/items", get(handler::list_items))
        .route("/v1/items/:name", post(handler::add_item))
        .route("/v1/items/:name/remove", post(handler::remove_item))
        .route("/v1/items/:name/like", post(handler::like_item))
        .route("/v1/items/:name/dislike", post(handler::dislike_item))
        .route("/v1/devices/:device/likes", get(handler::device_likes))
        .route("/v1/blobs/*key", get(handler::get_blob))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
