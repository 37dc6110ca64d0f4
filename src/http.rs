// HTTP interface - thin request validation and response shaping over the
// page and mutation services.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::{Comment, CommentPage, Reply, ReplyPage, ThreadPage};
use crate::service::{PageRequest, SortOrder};
use crate::storage::current_time_millis;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author_id: Uuid,
    pub body: String,
}

#[derive(Deserialize)]
pub struct CreateReplyRequest {
    pub author_id: Uuid,
    pub body: String,
}

#[derive(Deserialize)]
pub struct UpdateBodyRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub sort: Option<String>,
    pub replies_limit: Option<u32>,
}

fn page_request(state: &AppState, query: &ListQuery) -> Result<PageRequest, AppError> {
    let pages = &state.config.pages;
    let limit = query
        .limit
        .unwrap_or(pages.default_page_size)
        .min(pages.max_page_size);
    let sort = match query.sort.as_deref() {
        Some(value) => SortOrder::parse(value)?,
        None => SortOrder::default(),
    };
    Ok(PageRequest {
        limit,
        cursor: query.cursor.clone(),
        sort,
    })
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "threadstore",
        "timestamp": current_time_millis()
    }))
}

async fn create_comment_handler(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let comment = state
        .mutations
        .create_comment(video_id, request.author_id, request.body)
        .await?;
    Ok(Json(comment))
}

async fn list_comments_handler(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentPage>, AppError> {
    let request = page_request(&state, &query)?;
    let page = state
        .pages
        .comments_page(video_id, &request, current_time_millis())
        .await?;
    Ok(Json(page))
}

async fn list_threads_handler(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ThreadPage>, AppError> {
    let request = page_request(&state, &query)?;
    let replies_limit = query
        .replies_limit
        .unwrap_or(state.config.pages.default_replies_limit)
        .min(state.config.pages.max_page_size);
    let page = state
        .pages
        .threads_page(video_id, &request, replies_limit, current_time_millis())
        .await?;
    Ok(Json(page))
}

async fn get_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(state.mutations.get_comment(id).await?))
}

async fn update_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBodyRequest>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(
        state.mutations.update_comment_body(id, request.body).await?,
    ))
}

async fn delete_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.mutations.delete_comment(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

async fn create_reply_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<Json<Reply>, AppError> {
    let reply = state
        .mutations
        .create_reply(comment_id, request.author_id, request.body)
        .await?;
    Ok(Json(reply))
}

async fn list_replies_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ReplyPage>, AppError> {
    let request = page_request(&state, &query)?;
    let page = state
        .pages
        .replies_page(comment_id, &request, current_time_millis())
        .await?;
    Ok(Json(page))
}

async fn get_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(state.mutations.get_reply(id).await?))
}

async fn update_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBodyRequest>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(
        state.mutations.update_reply_body(id, request.body).await?,
    ))
}

async fn delete_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.mutations.delete_reply(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

async fn like_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(state.mutations.increment_comment_likes(id).await?))
}

async fn unlike_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(state.mutations.decrement_comment_likes(id).await?))
}

async fn dislike_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(state.mutations.increment_comment_dislikes(id).await?))
}

async fn undislike_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(state.mutations.decrement_comment_dislikes(id).await?))
}

async fn like_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(state.mutations.increment_reply_likes(id).await?))
}

async fn unlike_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(state.mutations.decrement_reply_likes(id).await?))
}

async fn dislike_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(state.mutations.increment_reply_dislikes(id).await?))
}

async fn undislike_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reply>, AppError> {
    Ok(Json(state.mutations.decrement_reply_dislikes(id).await?))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/videos/{video_id}/comments",
            post(create_comment_handler).get(list_comments_handler),
        )
        .route("/api/videos/{video_id}/threads", get(list_threads_handler))
        .route(
            "/api/comments/{id}",
            get(get_comment_handler)
                .put(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .route(
            "/api/comments/{id}/replies",
            post(create_reply_handler).get(list_replies_handler),
        )
        .route(
            "/api/comments/{id}/likes",
            post(like_comment_handler).delete(unlike_comment_handler),
        )
        .route(
            "/api/comments/{id}/dislikes",
            post(dislike_comment_handler).delete(undislike_comment_handler),
        )
        .route(
            "/api/replies/{id}",
            get(get_reply_handler)
                .put(update_reply_handler)
                .delete(delete_reply_handler),
        )
        .route(
            "/api/replies/{id}/likes",
            post(like_reply_handler).delete(unlike_reply_handler),
        )
        .route(
            "/api/replies/{id}/dislikes",
            post(dislike_reply_handler).delete(undislike_reply_handler),
        )
        .with_state(state)
}
