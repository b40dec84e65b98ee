//! Post repository.

use std::sync::Arc;

use crate::entities::{Category, Post, PostCategory, category, post, post_category};
use crate::repositories::contains_pattern;
use blog_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, Func, Query, SelectStatement, SimpleExpr},
};

/// Sort order of post listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    /// Newest first.
    #[default]
    Newest,
    /// Most viewed first.
    MostViewed,
    /// Most liked first.
    MostLiked,
    /// Alphabetical by title.
    Title,
}

impl PostOrder {
    /// Parse a listing `order` token. Unknown tokens fall back to [`PostOrder::Newest`].
    #[must_use]
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("-views") => Self::MostViewed,
            Some("-likes") => Self::MostLiked,
            Some("title") => Self::Title,
            _ => Self::Newest,
        }
    }

    /// The token this order is selected by.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Newest => "-created_on",
            Self::MostViewed => "-views",
            Self::MostLiked => "-likes",
            Self::Title => "title",
        }
    }

    fn apply(self, query: Select<Post>) -> Select<Post> {
        let query = match self {
            Self::Newest => query.order_by_desc(post::Column::CreatedOn),
            Self::MostViewed => query.order_by_desc(post::Column::Views),
            Self::MostLiked => query.order_by_desc(post::Column::Likes),
            Self::Title => query.order_by_asc(post::Column::Title),
        };
        query.order_by_desc(post::Column::Id)
    }
}

/// Filters for post listings. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive substring of title or body.
    pub search: Option<String>,
    /// Whether `search` also matches category names.
    pub search_categories: bool,
    /// Case-insensitive substring of a linked category name.
    pub category_name: Option<String>,
    /// Linked to this category.
    pub category_id: Option<i64>,
    /// Featured flag.
    pub featured: Option<bool>,
}

impl PostFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(term) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(term);
            let mut any = Condition::any()
                .add(lower_like(post::Column::Title, &pattern))
                .add(lower_like(post::Column::Body, &pattern));
            if self.search_categories {
                any = any.add(post::Column::Id.in_subquery(posts_in_categories_named(&pattern)));
            }
            condition = condition.add(any);
        }

        if let Some(name) = self.category_name.as_deref() {
            let pattern = contains_pattern(name);
            condition =
                condition.add(post::Column::Id.in_subquery(posts_in_categories_named(&pattern)));
        }

        if let Some(category_id) = self.category_id {
            condition = condition.add(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_category::Column::PostId)
                        .from(PostCategory)
                        .and_where(post_category::Column::CategoryId.eq(category_id))
                        .to_owned(),
                ),
            );
        }

        if let Some(featured) = self.featured {
            condition = condition.add(post::Column::Featured.eq(featured));
        }

        condition
    }
}

fn lower_like(column: post::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((Post, column)))).like(pattern)
}

/// IDs of posts linked to a category whose lowercased name matches `pattern`.
fn posts_in_categories_named(pattern: &str) -> SelectStatement {
    Query::select()
        .column((PostCategory, post_category::Column::PostId))
        .from(PostCategory)
        .inner_join(
            Category,
            Expr::col((Category, category::Column::Id))
                .equals((PostCategory, post_category::Column::CategoryId)),
        )
        .and_where(
            Expr::expr(Func::lower(Expr::col((Category, category::Column::Name)))).like(pattern),
        )
        .to_owned()
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, locking its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update<C>(conn: &C, id: i64) -> AppResult<Option<post::Model>>
    where
        C: ConnectionTrait,
    {
        Post::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID on an explicit connection.
    pub async fn find_by_id_in<C>(conn: &C, id: i64) -> AppResult<Option<post::Model>>
    where
        C: ConnectionTrait,
    {
        Post::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of posts matching `filter`.
    pub async fn find_page(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        order
            .apply(Post::find().filter(filter.condition()))
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts matching `filter`.
    pub async fn count(&self, filter: &PostFilter) -> AppResult<u64> {
        Post::find()
            .filter(filter.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Newest featured posts.
    pub async fn find_featured(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Featured.eq(true))
            .order_by_desc(post::Column::CreatedOn)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of all post views.
    pub async fn total_views(&self) -> AppResult<i64> {
        let total: Option<i64> = Post::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(views), 0)::BIGINT"), "total_views")
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(total.unwrap_or(0))
    }

    /// Increment the view counter atomically. Returns false if the post does not exist.
    pub async fn increment_views(&self, id: i64) -> AppResult<bool> {
        let result = Post::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .col_expr(post::Column::LastModified, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Shift the like and dislike counters by -1, 0 or +1 each in one UPDATE.
    /// Decrements never go below zero.
    pub async fn apply_reaction_delta<C>(
        conn: &C,
        id: i64,
        likes_delta: i32,
        dislikes_delta: i32,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        if likes_delta == 0 && dislikes_delta == 0 {
            return Ok(());
        }

        let mut update = Post::update_many();
        if let Some(expr) = counter_delta(post::Column::Likes, "likes", likes_delta) {
            update = update.col_expr(post::Column::Likes, expr);
        }
        if let Some(expr) = counter_delta(post::Column::Dislikes, "dislikes", dislikes_delta) {
            update = update.col_expr(post::Column::Dislikes, expr);
        }

        update
            .col_expr(post::Column::LastModified, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite the like and dislike counters.
    pub async fn set_reaction_counts<C>(
        conn: &C,
        id: i64,
        likes: i32,
        dislikes: i32,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Post::update_many()
            .col_expr(post::Column::Likes, Expr::value(likes))
            .col_expr(post::Column::Dislikes, Expr::value(dislikes))
            .col_expr(post::Column::LastModified, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Zero likes, dislikes and views of the given posts.
    pub async fn reset_engagement<C>(conn: &C, ids: &[i64]) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = Post::update_many()
            .col_expr(post::Column::Likes, Expr::value(0))
            .col_expr(post::Column::Dislikes, Expr::value(0))
            .col_expr(post::Column::Views, Expr::value(0))
            .col_expr(post::Column::LastModified, Expr::value(Utc::now()))
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Set the featured flag of the given posts.
    pub async fn set_featured(&self, ids: &[i64], featured: bool) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::Featured, Expr::value(featured))
            .col_expr(post::Column::LastModified, Expr::value(Utc::now()))
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Create a new post.
    pub async fn create<C>(conn: &C, model: post::ActiveModel) -> AppResult<post::Model>
    where
        C: ConnectionTrait,
    {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update<C>(conn: &C, model: post::ActiveModel) -> AppResult<post::Model>
    where
        C: ConnectionTrait,
    {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post with its comments, reactions and category links.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

fn counter_delta(column: post::Column, name: &str, delta: i32) -> Option<SimpleExpr> {
    match delta.signum() {
        1 => Some(Expr::col(column).add(1)),
        -1 => Some(Expr::cust(format!("GREATEST({name} - 1, 0)"))),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: i64, title: &str) -> post::Model {
        let now = Utc::now().into();
        post::Model {
            id,
            title: title.to_string(),
            body: "Body text".to_string(),
            image: None,
            likes: 3,
            dislikes: 1,
            views: 10,
            featured: false,
            created_on: now,
            last_modified: now,
        }
    }

    #[test]
    fn test_order_tokens() {
        assert_eq!(PostOrder::from_token(Some("-views")), PostOrder::MostViewed);
        assert_eq!(PostOrder::from_token(Some("-likes")), PostOrder::MostLiked);
        assert_eq!(PostOrder::from_token(Some("title")), PostOrder::Title);
        assert_eq!(PostOrder::from_token(Some("-created_on")), PostOrder::Newest);
        assert_eq!(PostOrder::from_token(Some("; DROP TABLE post")), PostOrder::Newest);
        assert_eq!(PostOrder::from_token(None), PostOrder::Newest);
        assert_eq!(PostOrder::MostLiked.token(), "-likes");
    }

    #[test]
    fn test_counter_delta() {
        assert!(counter_delta(post::Column::Likes, "likes", 0).is_none());
        assert!(counter_delta(post::Column::Likes, "likes", 1).is_some());
        assert!(counter_delta(post::Column::Likes, "likes", -1).is_some());
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(1, "Hello")]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.title, "Hello");
        assert_eq!(found.likes, 3);
    }

    #[tokio::test]
    async fn test_find_page_with_search() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(2, "Rust tips")]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let filter = PostFilter {
            search: Some("rust".to_string()),
            search_categories: true,
            ..Default::default()
        };
        let posts = repo
            .find_page(&filter, PostOrder::Newest, 0, 20)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 2);
    }

    #[tokio::test]
    async fn test_increment_views_missing_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(!repo.increment_views(404).await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_zero_delta_skips_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        PostRepository::apply_reaction_delta(&db, 1, 0, 0)
            .await
            .unwrap();

        assert!(db.into_transaction_log().is_empty());
    }
}
