//! Shared application state.

use std::sync::Arc;

use blog_common::Config;
use blog_core::{CategoryService, CommentService, PostService, ReactionService};
use blog_db::repositories::{CategoryRepository, CommentRepository, PostRepository};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Listings, detail pages and post management.
    pub post_service: PostService,
    /// Comment intake and moderation.
    pub comment_service: CommentService,
    /// Category management.
    pub category_service: CategoryService,
    /// Like/dislike reconciliation.
    pub reaction_service: ReactionService,
    /// Bearer token for `/admin`. `None` locks the back office.
    pub admin_token: Option<Arc<str>>,
    /// Rows per back-office page.
    pub page_size: u64,
}

impl AppState {
    /// Build every service over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let page_size = config.page_size();
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));

        Self {
            post_service: PostService::new(Arc::clone(&db), page_size),
            comment_service: CommentService::new(comment_repo, post_repo),
            category_service: CategoryService::new(category_repo),
            reaction_service: ReactionService::new(db),
            admin_token: config
                .admin
                .token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(Arc::from),
            page_size,
        }
    }
}
