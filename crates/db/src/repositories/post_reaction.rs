//! Post reaction repository.

use std::sync::Arc;

use crate::entities::{PostReaction, post_reaction, post_reaction::Sentiment};
use blog_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};

/// Map a store error, surfacing unique index violations as [`AppError::Conflict`].
fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::Conflict(msg),
        _ => AppError::Database(e.to_string()),
    }
}

/// Post reaction repository for database operations.
#[derive(Clone)]
pub struct PostReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl PostReactionRepository {
    /// Create a new post reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the reaction of a visitor address on a post.
    pub async fn find_by_post_and_ip<C>(
        conn: &C,
        post_id: i64,
        ip_address: &str,
    ) -> AppResult<Option<post_reaction::Model>>
    where
        C: ConnectionTrait,
    {
        PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::IpAddress.eq(ip_address))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The current sentiment of a visitor address on a post, if any.
    pub async fn sentiment_of(
        &self,
        post_id: i64,
        ip_address: &str,
    ) -> AppResult<Option<Sentiment>> {
        Ok(Self::find_by_post_and_ip(self.db.as_ref(), post_id, ip_address)
            .await?
            .map(|r| r.sentiment()))
    }

    /// Record a first reaction. A concurrent insert for the same
    /// (post, address) pair yields [`AppError::Conflict`].
    pub async fn insert<C>(
        conn: &C,
        post_id: i64,
        ip_address: &str,
        sentiment: Sentiment,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let model = post_reaction::ActiveModel {
            post_id: Set(post_id),
            ip_address: Set(ip_address.to_string()),
            is_like: Set(sentiment.is_like()),
            created_on: Set(Utc::now().into()),
            ..Default::default()
        };

        PostReaction::insert(model)
            .exec_without_returning(conn)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    /// Switch an existing reaction to `sentiment`.
    pub async fn set_sentiment<C>(conn: &C, id: i64, sentiment: Sentiment) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        PostReaction::update_many()
            .col_expr(post_reaction::Column::IsLike, Expr::value(sentiment.is_like()))
            .filter(post_reaction::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reaction.
    pub async fn delete<C>(conn: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        PostReaction::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every reaction on the given posts.
    pub async fn delete_by_posts<C>(conn: &C, post_ids: &[i64]) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = PostReaction::delete_many()
            .filter(post_reaction::Column::PostId.is_in(post_ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count (likes, dislikes) recorded for a post.
    pub async fn count_by_post<C>(conn: &C, post_id: i64) -> AppResult<(u64, u64)>
    where
        C: ConnectionTrait,
    {
        let likes = PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::IsLike.eq(true))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let dislikes = PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::IsLike.eq(false))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((likes, dislikes))
    }

    /// One page of reactions, newest first.
    pub async fn find_page(
        &self,
        post_id: Option<i64>,
        is_like: Option<bool>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post_reaction::Model>> {
        PostReaction::find()
            .filter(Self::condition(post_id, is_like))
            .order_by_desc(post_reaction::Column::CreatedOn)
            .order_by_desc(post_reaction::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reactions matching the filters.
    pub async fn count(&self, post_id: Option<i64>, is_like: Option<bool>) -> AppResult<u64> {
        PostReaction::find()
            .filter(Self::condition(post_id, is_like))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn condition(post_id: Option<i64>, is_like: Option<bool>) -> Condition {
        Condition::all()
            .add_option(post_id.map(|id| post_reaction::Column::PostId.eq(id)))
            .add_option(is_like.map(|like| post_reaction::Column::IsLike.eq(like)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_reaction(
        id: i64,
        post_id: i64,
        ip: &str,
        is_like: bool,
    ) -> post_reaction::Model {
        post_reaction::Model {
            id,
            post_id,
            ip_address: ip.to_string(),
            is_like,
            created_on: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_post_and_ip() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_reaction(1, 7, "10.0.0.1", false)]])
            .into_connection();

        let found = PostReactionRepository::find_by_post_and_ip(&db, 7, "10.0.0.1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.sentiment(), Sentiment::Dislike);
    }

    #[tokio::test]
    async fn test_sentiment_of_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post_reaction::Model>::new()])
                .into_connection(),
        );

        let repo = PostReactionRepository::new(db);
        assert_eq!(repo.sentiment_of(7, "10.0.0.1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        PostReactionRepository::insert(&db, 7, "10.0.0.1", Sentiment::Like)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_failure_is_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("boom".to_string())])
            .into_connection();

        let result = PostReactionRepository::insert(&db, 7, "10.0.0.1", Sentiment::Like).await;

        match result {
            Err(AppError::Database(msg)) => assert!(msg.contains("boom")),
            _ => panic!("Expected Database error"),
        }
    }
}
