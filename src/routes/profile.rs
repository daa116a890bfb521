use crate::{
    error::Result,
    models::{
        profile::{Profile, UpdateNicknameRequest},
        response::ApiResponse,
    },
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, put},
    Router,
};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_profile))
        .route("/nickname", put(update_nickname))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(actor): OptionalAuth,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state.profile_service.get_profile(actor.as_ref()).await?;
    Ok(Json(ApiResponse::success(profile)))
}

async fn update_nickname(
    State(state): State<Arc<AppState>>,
    OptionalAuth(actor): OptionalAuth,
    Json(request): Json<UpdateNicknameRequest>,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state
        .profile_service
        .update_nickname(actor.as_ref(), &request.nickname)
        .await?;

    Ok(Json(ApiResponse::success_with_message(profile, "Nickname updated")))
}
