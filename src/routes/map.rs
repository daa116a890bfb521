use crate::{
    error::Result,
    models::{
        marker::{CreateMarkerRequest, MapMarker, UpdateMarkerRequest},
        response::ApiResponse,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/markers", get(list_markers).post(add_marker))
        .route("/markers/:id", put(update_note).delete(remove_marker))
}

async fn list_markers(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<MapMarker>>> {
    Json(ApiResponse::success(state.marker_service.list_markers()))
}

async fn add_marker(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateMarkerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MapMarker>>)> {
    let marker = state.marker_service.add_marker(request)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(marker))))
}

async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateMarkerRequest>,
) -> Result<Json<ApiResponse<MapMarker>>> {
    let marker = state.marker_service.update_note(id, request.note)?;
    Ok(Json(ApiResponse::success(marker)))
}

async fn remove_marker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>> {
    state.marker_service.remove_marker(id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Marker removed"
    })))
}
