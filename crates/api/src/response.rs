//! Response documents shared by the endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blog_core::{PostPage, PostWithCategories, metrics::excerpt};
use blog_db::entities::{category, comment, post, post_reaction::Sentiment};
use serde::Serialize;

/// Back-office response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }

    /// Create a `201 Created` response.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self { data })).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// A category as shown next to posts.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: i64,
    /// Display label.
    pub name: String,
    /// Icon identifier.
    pub icon: String,
    /// Hex color.
    pub color: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            icon: c.icon,
            color: c.color,
        }
    }
}

/// A category reduced to what a badge needs.
#[derive(Debug, Serialize)]
pub struct CategoryBadge {
    /// Display label.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// Icon identifier.
    pub icon: String,
}

impl From<category::Model> for CategoryBadge {
    fn from(c: category::Model) -> Self {
        Self {
            name: c.name,
            color: c.color,
            icon: c.icon,
        }
    }
}

/// A comment.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    /// Comment ID.
    pub id: i64,
    /// Display name of the commenter.
    pub author: String,
    /// Comment text.
    pub body: String,
    /// Contact address, if given.
    pub email: Option<String>,
    /// Posting time (RFC 3339).
    pub date: String,
    /// Pinned by an administrator.
    pub is_featured: bool,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            author: c.author,
            body: c.body,
            email: c.email,
            date: c.created_on.to_rfc3339(),
            is_featured: c.is_featured,
        }
    }
}

/// A post in a listing.
#[derive(Debug, Serialize)]
pub struct PostCard {
    /// Post ID.
    pub id: i64,
    /// Post title.
    pub title: String,
    /// Start of the body.
    pub excerpt: String,
    /// Main image reference.
    pub image: Option<String>,
    /// Creation time (RFC 3339).
    pub date: String,
    /// Categories of the post.
    pub categories: Vec<CategoryResponse>,
    /// Like count.
    pub likes: i32,
    /// Dislike count.
    pub dislikes: i32,
    /// View count.
    pub views: i32,
    /// Shown on the front page.
    pub featured: bool,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    /// Percentage of reactions that are likes.
    pub engagement_ratio: f64,
}

impl From<PostWithCategories> for PostCard {
    fn from(p: PostWithCategories) -> Self {
        let reading_time = p.reading_time();
        let engagement_ratio = p.engagement_ratio();
        let PostWithCategories { post, categories } = p;

        Self {
            id: post.id,
            excerpt: excerpt(&post.body),
            title: post.title,
            image: post.image,
            date: post.created_on.to_rfc3339(),
            categories: categories.into_iter().map(Into::into).collect(),
            likes: post.likes,
            dislikes: post.dislikes,
            views: post.views,
            featured: post.featured,
            reading_time,
            engagement_ratio,
        }
    }
}

/// A post with its full body.
#[derive(Debug, Serialize)]
pub struct PostResponse {
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
    /// Last change (RFC 3339).
    pub last_modified: String,
    /// Categories of the post.
    pub categories: Vec<CategoryResponse>,
    /// Like count.
    pub likes: i32,
    /// Dislike count.
    pub dislikes: i32,
    /// View count.
    pub views: i32,
    /// Shown on the front page.
    pub featured: bool,
}

impl PostResponse {
    /// Build from a post and its categories.
    #[must_use]
    pub fn new(post: post::Model, categories: Vec<category::Model>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            image: post.image,
            date: post.created_on.to_rfc3339(),
            last_modified: post.last_modified.to_rfc3339(),
            categories: categories.into_iter().map(Into::into).collect(),
            likes: post.likes,
            dislikes: post.dislikes,
            views: post.views,
            featured: post.featured,
        }
    }
}

impl From<PostWithCategories> for PostResponse {
    fn from(p: PostWithCategories) -> Self {
        Self::new(p.post, p.categories)
    }
}

/// Pagination of a listing.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    /// Current page, starting at 1.
    pub number: u64,
    /// Rows per page.
    pub per_page: u64,
    /// Matching rows.
    pub total: u64,
    /// Number of pages, at least 1.
    pub total_pages: u64,
}

impl From<&PostPage> for PageInfo {
    fn from(page: &PostPage) -> Self {
        Self {
            number: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}

impl PageInfo {
    /// Pagination for `total` rows shown `per_page` at a time.
    #[must_use]
    pub const fn new(number: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(per_page)
        };
        Self {
            number,
            per_page,
            total,
            total_pages,
        }
    }
}

/// The visitor's reaction as reported to clients.
#[must_use]
pub const fn reaction_label(sentiment: Option<Sentiment>) -> Option<&'static str> {
    match sentiment {
        Some(Sentiment::Like) => Some("like"),
        Some(Sentiment::Dislike) => Some("dislike"),
        None => None,
    }
}

/// Number of rows touched by a bulk action.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    /// Rows changed.
    pub updated: u64,
}
