//! Public pages: listing, category listing, post detail and the comment form.

use axum::{
    Form, Json, Router,
    extract::{OriginalUri, Path, State, rejection::FormRejection},
    response::{IntoResponse, Redirect},
    routing::get,
};
use blog_common::{AppError, AppResult};
use blog_core::{ListQuery, NewComment, PostDetail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse_post_id;
use crate::{
    extractors::{ApiQuery, ClientIp},
    middleware::AppState,
    response::{CategoryResponse, CommentResponse, PageInfo, PostCard, PostResponse, reaction_label},
};

// ==================== Request/Response Types ====================

/// The front page.
#[derive(Serialize)]
pub struct IndexResponse {
    /// Posts on this page.
    pub posts: Vec<PostCard>,
    /// Pagination.
    pub page: PageInfo,
    /// Search term in effect.
    pub search_query: Option<String>,
    /// Sort token in effect.
    pub order: &'static str,
    /// Featured posts.
    pub featured_posts: Vec<PostCard>,
    /// All categories.
    pub categories: Vec<CategoryResponse>,
    /// Number of posts.
    pub total_posts: u64,
    /// Views across all posts.
    pub total_views: i64,
}

/// A category listing.
#[derive(Serialize)]
pub struct CategoryListResponse {
    /// Requested name fragment.
    pub category: String,
    /// First category matching the fragment.
    pub category_obj: Option<CategoryResponse>,
    /// Posts on this page.
    pub posts: Vec<PostCard>,
    /// Pagination.
    pub page: PageInfo,
    /// All categories.
    pub categories: Vec<CategoryResponse>,
}

/// Query parameters of a category listing.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Page number, starting at 1.
    pub page: Option<u64>,
}

/// A post's page.
#[derive(Serialize)]
pub struct DetailResponse {
    /// The post.
    pub post: PostResponse,
    /// Comments, featured first.
    pub comments: Vec<CommentResponse>,
    /// The visitor's reaction.
    pub user_reaction: Option<&'static str>,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    /// Percentage of reactions that are likes.
    pub engagement_ratio: f64,
    /// All categories.
    pub all_categories: Vec<CategoryResponse>,
}

impl From<PostDetail> for DetailResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            post: PostResponse::new(detail.post, detail.categories),
            comments: detail.comments.into_iter().map(Into::into).collect(),
            user_reaction: reaction_label(detail.user_reaction),
            reading_time: detail.reading_time,
            engagement_ratio: detail.engagement_ratio,
            all_categories: detail.all_categories.into_iter().map(Into::into).collect(),
        }
    }
}

// ==================== Handlers ====================

/// List posts with the index aggregates.
async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<IndexResponse>> {
    let index = state.post_service.index(&query).await?;
    let page = PageInfo::from(&index.listing);

    Ok(Json(IndexResponse {
        page,
        search_query: index.listing.search,
        order: index.listing.order.token(),
        posts: index.listing.posts.into_iter().map(Into::into).collect(),
        featured_posts: index.featured.into_iter().map(Into::into).collect(),
        categories: index.categories.into_iter().map(Into::into).collect(),
        total_posts: index.total_posts,
        total_views: index.total_views,
    }))
}

/// Posts in the categories whose name contains the path segment.
async fn category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> AppResult<Json<CategoryListResponse>> {
    let listing = state.post_service.by_category(&name, query.page).await?;
    let page = PageInfo::from(&listing.listing);

    Ok(Json(CategoryListResponse {
        category: listing.name,
        category_obj: listing.category.map(Into::into),
        posts: listing.listing.posts.into_iter().map(Into::into).collect(),
        page,
        categories: listing.categories.into_iter().map(Into::into).collect(),
    }))
}

/// A post's page. Counts a view.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ip: ClientIp,
) -> AppResult<Json<DetailResponse>> {
    let id = parse_post_id(&id)?;
    let ip = ip.as_string();
    let detail = state.post_service.view(id, ip.as_deref()).await?;

    Ok(Json(detail.into()))
}

/// Comment form submission: append the comment and send the visitor back to the post.
async fn comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    ip: ClientIp,
    form: Result<Form<NewComment>, FormRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_post_id(&id)?;
    let Form(input) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let ip = ip.as_string();

    // The form lives on the detail page, which counts a view.
    state.post_service.view(id, ip.as_deref()).await?;
    state.comment_service.add(id, &input, ip).await?;
    debug!(post_id = id, "Comment form accepted");

    Ok(Redirect::to(uri.path()))
}

/// Page routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/category/{category}", get(category))
        .route("/post/{id}", get(detail).post(comment))
}
