//! Category repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Category, PostCategory, category, post_category};
use crate::repositories::contains_pattern;
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All categories, by name.
    pub async fn find_all(&self) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Categories with the given IDs.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// First category whose name contains `fragment`, ignoring case.
    pub async fn find_first_name_containing(
        &self,
        fragment: &str,
    ) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(category::Column::Name)))
                    .like(contains_pattern(fragment)),
            )
            .order_by_asc(category::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Categories of a single post.
    pub async fn find_for_post(&self, post_id: i64) -> AppResult<Vec<category::Model>> {
        Ok(self
            .find_for_posts(&[post_id])
            .await?
            .remove(&post_id)
            .unwrap_or_default())
    }

    /// Categories of several posts, keyed by post ID.
    pub async fn find_for_posts(
        &self,
        post_ids: &[i64],
    ) -> AppResult<HashMap<i64, Vec<category::Model>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PostCategory::find()
            .filter(post_category::Column::PostId.is_in(post_ids.iter().copied()))
            .find_also_related(Category)
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut map: HashMap<i64, Vec<category::Model>> = HashMap::new();
        for (link, category) in rows {
            if let Some(category) = category {
                map.entry(link.post_id).or_default().push(category);
            }
        }
        Ok(map)
    }

    /// Number of linked posts per category ID. Categories without posts are absent.
    pub async fn post_counts(&self) -> AppResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = PostCategory::find()
            .select_only()
            .column(post_category::Column::CategoryId)
            .column_as(post_category::Column::PostId.count(), "post_count")
            .group_by(post_category::Column::CategoryId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().collect())
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a category.
    pub async fn update(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a category. Links to posts cascade; the posts remain.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Replace the category links of a post.
    pub async fn set_post_categories<C>(
        conn: &C,
        post_id: i64,
        category_ids: &[i64],
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        PostCategory::delete_many()
            .filter(post_category::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if category_ids.is_empty() {
            return Ok(());
        }

        let mut ids = category_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let links = ids.into_iter().map(|category_id| post_category::ActiveModel {
            post_id: sea_orm::Set(post_id),
            category_id: sea_orm::Set(category_id),
        });

        PostCategory::insert_many(links)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_category(id: i64, name: &str) -> category::Model {
        category::Model {
            id,
            name: name.to_string(),
            icon: category::DEFAULT_ICON.to_string(),
            color: category::DEFAULT_COLOR.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_category(1, "Rust")]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.name, "Rust");
        assert_eq!(found.color, "#3b2342");
    }

    #[tokio::test]
    async fn test_find_first_name_containing_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.find_first_name_containing("nothing").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        // No query results appended: touching the store would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CategoryRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
        assert!(repo.find_for_posts(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        assert!(!repo.delete(99).await.unwrap());
    }
}
