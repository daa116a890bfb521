use crate::{
    error::Result,
    models::{
        comment::{Comment, CreateCommentRequest},
        post::{CreatePostRequest, Post, PostDetail, PostQuery},
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
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).delete(delete_post))
        .route("/posts/:id/recommend", post(recommend_post))
        .route("/posts/:id/comments", post(add_comment))
        .route("/posts/:id/comments/:comment_id", delete(delete_comment))
}

/// GET /api/board/posts?category=&search=&sort=
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let posts = state.board_service.browse_posts(&query)?;
    Ok(Json(ApiResponse::success(posts)))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(actor): OptionalAuth,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Post>>)> {
    let post = state
        .board_service
        .create_post(request, actor.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(post))))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<PostDetail>>> {
    let detail = state.board_service.get_post_detail(id)?;
    Ok(Json(ApiResponse::success(detail)))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    OptionalAuth(actor): OptionalAuth,
) -> Result<Json<Value>> {
    let deleted = state.board_service.delete_post(id, actor.as_ref())?;

    Ok(Json(json!({
        "success": true,
        "data": { "deleted": deleted }
    })))
}

async fn recommend_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    OptionalAuth(actor): OptionalAuth,
) -> Result<Json<ApiResponse<VoteResult>>> {
    let result = state.board_service.recommend_post(id, actor.as_ref())?;
    Ok(Json(ApiResponse::success(result)))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    OptionalAuth(actor): OptionalAuth,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>)> {
    let comment = state
        .board_service
        .add_comment(id, request, actor.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(u64, String)>,
    OptionalAuth(actor): OptionalAuth,
) -> Result<Json<Value>> {
    state
        .board_service
        .delete_comment(id, &comment_id, actor.as_ref())?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted"
    })))
}
