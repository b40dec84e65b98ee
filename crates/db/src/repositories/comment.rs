//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, Post, comment, post};
use crate::repositories::contains_pattern;
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, Query},
};

/// Filters for the back-office comment list.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// Case-insensitive substring of author, body, email or post title.
    pub search: Option<String>,
    /// Featured flag.
    pub featured: Option<bool>,
    /// Belongs to this post.
    pub post_id: Option<i64>,
}

impl CommentFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(term) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(term);
            let lower = |column: comment::Column| {
                Expr::expr(Func::lower(Expr::col((Comment, column)))).like(pattern.as_str())
            };
            condition = condition.add(
                Condition::any()
                    .add(lower(comment::Column::Author))
                    .add(lower(comment::Column::Body))
                    .add(lower(comment::Column::Email))
                    .add(
                        comment::Column::PostId.in_subquery(
                            Query::select()
                                .column(post::Column::Id)
                                .from(Post)
                                .and_where(
                                    Expr::expr(Func::lower(Expr::col(post::Column::Title)))
                                        .like(pattern.as_str()),
                                )
                                .to_owned(),
                        ),
                    ),
            );
        }

        if let Some(featured) = self.featured {
            condition = condition.add(comment::Column::IsFeatured.eq(featured));
        }

        if let Some(post_id) = self.post_id {
            condition = condition.add(comment::Column::PostId.eq(post_id));
        }

        condition
    }
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments of a post, featured first, then newest first.
    pub async fn find_by_post(&self, post_id: i64) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::IsFeatured)
            .order_by_desc(comment::Column::CreatedOn)
            .order_by_desc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of comments matching `filter`, newest first.
    pub async fn find_page(
        &self,
        filter: &CommentFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(filter.condition())
            .order_by_desc(comment::Column::CreatedOn)
            .order_by_desc(comment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments matching `filter`.
    pub async fn count(&self, filter: &CommentFilter) -> AppResult<u64> {
        Comment::find()
            .filter(filter.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the featured flag of the given comments.
    pub async fn set_featured(&self, ids: &[i64], featured: bool) -> AppResult<u64> {
        let result = Comment::update_many()
            .col_expr(comment::Column::IsFeatured, Expr::value(featured))
            .filter(comment::Column::Id.is_in(ids.iter().copied()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete a comment.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
