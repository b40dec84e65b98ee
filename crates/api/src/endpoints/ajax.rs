//! AJAX endpoints used by the post page scripts.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use blog_common::{AppError, AppResult};
use blog_core::{NewComment, ReactionOutcome, metrics::excerpt};
use blog_db::entities::post_reaction::Sentiment;
use serde::{Deserialize, Serialize};

use super::parse_post_id;
use crate::{
    extractors::{ApiJson, ApiQuery, ClientIp},
    middleware::AppState,
    response::{CategoryBadge, CommentResponse, reaction_label},
};

// ==================== Request/Response Types ====================

/// A post id sent either as a JSON integer or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostIdParam {
    /// JSON integer.
    Number(i64),
    /// Numeric string.
    Text(String),
}

impl PostIdParam {
    fn resolve(&self) -> Option<i64> {
        match self {
            Self::Number(id) => Some(*id),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

fn require_post_id(post_id: Option<&PostIdParam>) -> AppResult<i64> {
    post_id
        .and_then(PostIdParam::resolve)
        .ok_or_else(|| AppError::BadRequest("post_id is required".to_string()))
}

/// Add comment request.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    /// Target post.
    #[serde(default)]
    pub post_id: Option<PostIdParam>,
    /// Comment fields.
    #[serde(flatten)]
    pub comment: NewComment,
}

/// Like post request.
#[derive(Debug, Deserialize)]
pub struct LikePostRequest {
    /// Target post.
    #[serde(default)]
    pub post_id: Option<PostIdParam>,
    /// `true` to like, `false` to dislike.
    #[serde(default)]
    pub is_like: Option<bool>,
}

/// Live search query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Search term.
    #[serde(default)]
    pub q: String,
}

/// Full post data.
#[derive(Serialize)]
pub struct PostDataResponse {
    /// Post ID.
    pub id: i64,
    /// Post title.
    pub title: String,
    /// Full body.
    pub body: String,
    /// Main image reference.
    pub image: Option<String>,
    /// Creation time (RFC 3339).
    pub date: String,
    /// Categories of the post.
    pub categories: Vec<CategoryBadge>,
    /// Comments, featured first.
    pub comments: Vec<CommentResponse>,
    /// Like count.
    pub likes: i32,
    /// Dislike count.
    pub dislikes: i32,
    /// View count.
    pub views: i32,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    /// Percentage of reactions that are likes.
    pub engagement_ratio: f64,
    /// The visitor's reaction.
    pub user_reaction: Option<&'static str>,
    /// Shown on the front page.
    pub featured: bool,
}

/// Add comment response.
#[derive(Serialize)]
pub struct AddCommentResponse {
    /// Always `true`.
    pub success: bool,
    /// The stored comment.
    pub comment: CommentResponse,
}

/// Like post response.
#[derive(Serialize)]
pub struct LikePostResponse {
    /// Always `true`.
    pub success: bool,
    /// Reconciliation result.
    #[serde(flatten)]
    pub outcome: ReactionOutcome,
}

/// One live search hit.
#[derive(Serialize)]
pub struct SearchHit {
    /// Post ID.
    pub id: i64,
    /// Post title.
    pub title: String,
    /// Start of the body.
    pub excerpt: String,
    /// Category names.
    pub categories: Vec<String>,
    /// Creation time (RFC 3339).
    pub date: String,
    /// View count.
    pub views: i32,
    /// Like count.
    pub likes: i32,
}

/// Live search response.
#[derive(Serialize)]
pub struct SearchResponse {
    /// Matching posts, newest first.
    pub results: Vec<SearchHit>,
}

// ==================== Handlers ====================

/// Full data of a post. Counts a view.
async fn post_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ip: ClientIp,
) -> AppResult<Json<PostDataResponse>> {
    let id = parse_post_id(&id)?;
    let ip = ip.as_string();
    let detail = state.post_service.view(id, ip.as_deref()).await?;
    let post = detail.post;

    Ok(Json(PostDataResponse {
        id: post.id,
        title: post.title,
        body: post.body,
        image: post.image,
        date: post.created_on.to_rfc3339(),
        categories: detail.categories.into_iter().map(Into::into).collect(),
        comments: detail.comments.into_iter().map(Into::into).collect(),
        likes: post.likes,
        dislikes: post.dislikes,
        views: post.views,
        reading_time: detail.reading_time,
        engagement_ratio: detail.engagement_ratio,
        user_reaction: reaction_label(detail.user_reaction),
        featured: post.featured,
    }))
}

/// Append a comment to a post.
async fn add_comment(
    State(state): State<AppState>,
    ip: ClientIp,
    ApiJson(req): ApiJson<AddCommentRequest>,
) -> AppResult<Json<AddCommentResponse>> {
    let post_id = require_post_id(req.post_id.as_ref())?;
    let comment = state
        .comment_service
        .add(post_id, &req.comment, ip.as_string())
        .await?;

    Ok(Json(AddCommentResponse {
        success: true,
        comment: comment.into(),
    }))
}

/// Like or dislike a post on behalf of the requesting address.
async fn like_post(
    State(state): State<AppState>,
    ip: ClientIp,
    ApiJson(req): ApiJson<LikePostRequest>,
) -> AppResult<Json<LikePostResponse>> {
    let post_id = require_post_id(req.post_id.as_ref())?;
    let is_like = req
        .is_like
        .ok_or_else(|| AppError::BadRequest("is_like is required".to_string()))?;
    let ip = ip
        .as_string()
        .ok_or_else(|| AppError::BadRequest("Client address unavailable".to_string()))?;

    let outcome = state
        .reaction_service
        .react(post_id, &ip, Sentiment::from_is_like(is_like))
        .await?;

    Ok(Json(LikePostResponse {
        success: true,
        outcome,
    }))
}

/// Typeahead search over titles, bodies and category names.
async fn live_search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let posts = state.post_service.live_search(&query.q).await?;

    let results = posts
        .into_iter()
        .map(|p| SearchHit {
            id: p.post.id,
            excerpt: excerpt(&p.post.body),
            title: p.post.title,
            categories: p.categories.into_iter().map(|c| c.name).collect(),
            date: p.post.created_on.to_rfc3339(),
            views: p.post.views,
            likes: p.post.likes,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

/// AJAX routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ajax/post/{id}", get(post_data))
        .route("/ajax/add-comment", post(add_comment))
        .route("/ajax/like-post", post(like_post))
        .route("/ajax/search", get(live_search))
}
