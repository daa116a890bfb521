use crate::{
    error::Result,
    models::{
        gunsmith::{CreateModRequest, ModEntry, ModQuery, ALL_CATEGORIES},
        response::ApiResponse,
    },
    services::votes::VoteResult,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mods", get(list_mods).post(submit_mod))
        .route("/mods/:id/recommend", post(recommend_mod))
        .route("/best", get(best_mods))
        .route("/weapons", get(list_weapons))
}

#[derive(Debug, Deserialize)]
struct WeaponQuery {
    category: Option<String>,
}

async fn list_mods(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModQuery>,
) -> Result<Json<ApiResponse<Vec<ModEntry>>>> {
    let mods = state.mod_service.list_mods(&query)?;
    Ok(Json(ApiResponse::success(mods)))
}

async fn best_mods(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModQuery>,
) -> Result<Json<ApiResponse<Vec<ModEntry>>>> {
    let mods = state.mod_service.best_mods(&query)?;
    Ok(Json(ApiResponse::success(mods)))
}

async fn list_weapons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeaponQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let weapons = state.mod_service.weapons_in_category(category)?;
    Ok(Json(ApiResponse::success(weapons)))
}

async fn submit_mod(
    State(state): State<Arc<AppState>>,
    OptionalAuth(actor): OptionalAuth,
    Json(request): Json<CreateModRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ModEntry>>)> {
    let entry = state
        .mod_service
        .submit_mod(request, actor.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(entry, "Mod submitted")),
    ))
}

async fn recommend_mod(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    OptionalAuth(actor): OptionalAuth,
) -> Result<Json<ApiResponse<VoteResult>>> {
    let result = state.mod_service.recommend_mod(&id, actor.as_ref())?;
    Ok(Json(ApiResponse::success(result)))
}
