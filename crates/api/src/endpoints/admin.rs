//! Back-office endpoints. Every handler requires [`AdminAuth`].

use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use blog_common::AppResult;
use blog_core::{
    AdminPostQuery, CategoryWithCount, CreateCategoryInput, CreatePostInput, UpdateCategoryInput,
    UpdatePostInput, page_window,
};
use blog_db::{
    entities::{comment, post_reaction},
    repositories::CommentFilter,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse_post_id;
use crate::{
    extractors::{AdminAuth, ApiJson, ApiQuery},
    middleware::AppState,
    response::{ApiResponse, BulkResult, CategoryResponse, PageInfo, PostResponse, no_content},
};

// ==================== Request/Response Types ====================

/// Ids targeted by a bulk action.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    /// Target ids.
    pub ids: Vec<i64>,
}

/// Back-office comment list query.
#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    /// Substring of author, body, email or post title.
    pub search: Option<String>,
    /// Featured flag.
    pub featured: Option<bool>,
    /// Owning post.
    pub post_id: Option<i64>,
    /// Page number, starting at 1.
    pub page: Option<u64>,
}

/// Back-office reaction list query.
#[derive(Debug, Default, Deserialize)]
pub struct ReactionListQuery {
    /// Reacted post.
    pub post_id: Option<i64>,
    /// Sentiment.
    pub is_like: Option<bool>,
    /// Page number, starting at 1.
    pub page: Option<u64>,
}

/// A page of posts.
#[derive(Serialize)]
pub struct PostListResponse {
    /// Posts on this page.
    pub posts: Vec<PostResponse>,
    /// Pagination.
    pub page: PageInfo,
}

/// A comment with its moderation fields.
#[derive(Serialize)]
pub struct AdminCommentResponse {
    /// Comment ID.
    pub id: i64,
    /// Owning post.
    pub post_id: i64,
    /// Display name of the commenter.
    pub author: String,
    /// Comment text.
    pub body: String,
    /// Preview of the body.
    pub short_body: String,
    /// Contact address, if given.
    pub email: Option<String>,
    /// Origin address.
    pub ip_address: Option<String>,
    /// Pinned by an administrator.
    pub is_featured: bool,
    /// Posting time (RFC 3339).
    pub date: String,
}

impl From<comment::Model> for AdminCommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            short_body: c.short_body(),
            id: c.id,
            post_id: c.post_id,
            author: c.author,
            body: c.body,
            email: c.email,
            ip_address: c.ip_address,
            is_featured: c.is_featured,
            date: c.created_on.to_rfc3339(),
        }
    }
}

/// A page of comments.
#[derive(Serialize)]
pub struct CommentListResponse {
    /// Comments on this page.
    pub comments: Vec<AdminCommentResponse>,
    /// Pagination.
    pub page: PageInfo,
}

/// A stored reaction.
#[derive(Serialize)]
pub struct ReactionResponse {
    /// Reaction ID.
    pub id: i64,
    /// Reacted post.
    pub post_id: i64,
    /// Visitor address.
    pub ip_address: String,
    /// `true` for a like.
    pub is_like: bool,
    /// First recorded (RFC 3339).
    pub date: String,
}

impl From<post_reaction::Model> for ReactionResponse {
    fn from(r: post_reaction::Model) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            ip_address: r.ip_address,
            is_like: r.is_like,
            date: r.created_on.to_rfc3339(),
        }
    }
}

/// A page of reactions.
#[derive(Serialize)]
pub struct ReactionListResponse {
    /// Reactions on this page.
    pub reactions: Vec<ReactionResponse>,
    /// Pagination.
    pub page: PageInfo,
}

// ==================== Categories ====================

/// List categories with post counts.
async fn list_categories(
    _: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CategoryWithCount>>> {
    let categories = state.category_service.all_with_counts().await?;
    Ok(ApiResponse::ok(categories))
}

/// Create a category.
async fn create_category(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCategoryInput>,
) -> AppResult<Response> {
    let category = state.category_service.create(input).await?;
    Ok(ApiResponse::created(CategoryResponse::from(category)))
}

/// Update a category.
async fn update_category(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateCategoryInput>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.update(id, input).await?;
    Ok(ApiResponse::ok(category.into()))
}

/// Delete a category. Its posts are kept.
async fn delete_category(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.category_service.delete(id).await?;
    Ok(no_content())
}

// ==================== Posts ====================

/// List posts with search and filters.
async fn list_posts(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminPostQuery>,
) -> AppResult<ApiResponse<PostListResponse>> {
    let listing = state.post_service.admin_list(&query).await?;
    let page = PageInfo::from(&listing);

    Ok(ApiResponse::ok(PostListResponse {
        posts: listing.posts.into_iter().map(Into::into).collect(),
        page,
    }))
}

/// Create a post.
async fn create_post(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> AppResult<Response> {
    let post = state.post_service.create(input).await?;
    Ok(ApiResponse::created(PostResponse::from(post)))
}

/// Get a post without counting a view.
async fn get_post(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(parse_post_id(&id)?).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Update a post.
async fn update_post(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(parse_post_id(&id)?, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Delete a post with its comments and reactions.
async fn delete_post(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(parse_post_id(&id)?).await?;
    Ok(no_content())
}

/// Feature posts.
async fn feature_posts(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkRequest>,
) -> AppResult<ApiResponse<BulkResult>> {
    let updated = state.post_service.set_featured(&req.ids, true).await?;
    Ok(ApiResponse::ok(BulkResult { updated }))
}

/// Unfeature posts.
async fn unfeature_posts(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkRequest>,
) -> AppResult<ApiResponse<BulkResult>> {
    let updated = state.post_service.set_featured(&req.ids, false).await?;
    Ok(ApiResponse::ok(BulkResult { updated }))
}

/// Zero likes, dislikes and views of posts and drop their reactions.
async fn reset_engagement(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkRequest>,
) -> AppResult<ApiResponse<BulkResult>> {
    let updated = state.reaction_service.reset_engagement(&req.ids).await?;
    Ok(ApiResponse::ok(BulkResult { updated }))
}

/// Rebuild a post's counters from its reactions.
async fn recount(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let id = parse_post_id(&id)?;
    state.reaction_service.recount(id).await?;
    let post = state.post_service.get(id).await?;
    Ok(ApiResponse::ok(post.into()))
}

// ==================== Comments ====================

/// List comments with search and filters.
async fn list_comments(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> AppResult<ApiResponse<CommentListResponse>> {
    let (number, offset) = page_window(query.page, state.page_size);
    let filter = CommentFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        featured: query.featured,
        post_id: query.post_id,
    };

    let (comments, total) = state
        .comment_service
        .list(&filter, offset, state.page_size)
        .await?;

    Ok(ApiResponse::ok(CommentListResponse {
        comments: comments.into_iter().map(Into::into).collect(),
        page: PageInfo::new(number, state.page_size, total),
    }))
}

/// Delete a comment.
async fn delete_comment(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.comment_service.delete(id).await?;
    Ok(no_content())
}

/// Feature comments.
async fn feature_comments(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkRequest>,
) -> AppResult<ApiResponse<BulkResult>> {
    let updated = state.comment_service.set_featured(&req.ids, true).await?;
    Ok(ApiResponse::ok(BulkResult { updated }))
}

/// Unfeature comments.
async fn unfeature_comments(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkRequest>,
) -> AppResult<ApiResponse<BulkResult>> {
    let updated = state.comment_service.set_featured(&req.ids, false).await?;
    Ok(ApiResponse::ok(BulkResult { updated }))
}

// ==================== Reactions ====================

/// List stored reactions.
async fn list_reactions(
    _: AdminAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReactionListQuery>,
) -> AppResult<ApiResponse<ReactionListResponse>> {
    let (number, offset) = page_window(query.page, state.page_size);
    let (reactions, total) = state
        .reaction_service
        .list(query.post_id, query.is_like, offset, state.page_size)
        .await?;

    debug!(total, "Reactions listed");
    Ok(ApiResponse::ok(ReactionListResponse {
        reactions: reactions.into_iter().map(Into::into).collect(),
        page: PageInfo::new(number, state.page_size, total),
    }))
}

/// Back-office routes, nested under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            patch(update_category).delete(delete_category),
        )
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/feature", post(feature_posts))
        .route("/posts/unfeature", post(unfeature_posts))
        .route("/posts/reset-engagement", post(reset_engagement))
        .route(
            "/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/{id}/recount", post(recount))
        .route("/comments", get(list_comments))
        .route("/comments/feature", post(feature_comments))
        .route("/comments/unfeature", post(unfeature_comments))
        .route("/comments/{id}", delete(delete_comment))
        .route("/reactions", get(list_reactions))
}

