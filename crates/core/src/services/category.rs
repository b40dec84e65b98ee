//! Category service.

use blog_common::{AppError, AppResult};
use blog_db::entities::category;
use blog_db::repositories::CategoryRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    /// Display label.
    #[validate(length(min = 1, max = 30))]
    pub name: String,
    /// Icon identifier.
    #[validate(length(min = 1, max = 50))]
    pub icon: Option<String>,
    /// Hex color (`#RGB` or `#RRGGBB`).
    pub color: Option<String>,
}

/// Input for updating a category. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    /// New label.
    #[validate(length(min = 1, max = 30))]
    pub name: Option<String>,
    /// New icon identifier.
    #[validate(length(min = 1, max = 50))]
    pub icon: Option<String>,
    /// New hex color.
    pub color: Option<String>,
}

/// A category with the number of posts linked to it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    /// The category.
    #[serde(flatten)]
    pub category: category::Model,
    /// Linked posts.
    pub post_count: i64,
}

/// Service for managing categories.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    /// All categories, by name.
    pub async fn all(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.find_all().await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: i64) -> AppResult<category::Model> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {id}")))
    }

    /// All categories with their post counts.
    pub async fn all_with_counts(&self) -> AppResult<Vec<CategoryWithCount>> {
        let categories = self.category_repo.find_all().await?;
        let counts = self.category_repo.post_counts().await?;

        Ok(categories
            .into_iter()
            .map(|category| CategoryWithCount {
                post_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }

    /// Create a new category.
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        if let Some(ref color) = input.color {
            if !is_valid_color(color) {
                return Err(AppError::Validation("Invalid color format".to_string()));
            }
        }

        let model = category::ActiveModel {
            name: Set(input.name.trim().to_string()),
            icon: Set(input
                .icon
                .unwrap_or_else(|| category::DEFAULT_ICON.to_string())),
            color: Set(input
                .color
                .unwrap_or_else(|| category::DEFAULT_COLOR.to_string())),
            ..Default::default()
        };

        let created = self.category_repo.create(model).await?;
        info!(category_id = created.id, name = %created.name, "Category created");
        Ok(created)
    }

    /// Update a category.
    pub async fn update(&self, id: i64, input: UpdateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        if let Some(ref color) = input.color {
            if !is_valid_color(color) {
                return Err(AppError::Validation("Invalid color format".to_string()));
            }
        }

        let category = self.get(id).await?;
        let mut active: category::ActiveModel = category.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }

        self.category_repo.update(active).await
    }

    /// Delete a category. Its posts are kept.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.category_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Category {id}")));
        }
        info!(category_id = id, "Category deleted");
        Ok(())
    }
}

/// Validate a hex color (#RGB or #RRGGBB).
fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };

    match hex.len() {
        3 | 6 => hex.chars().all(|c| c.is_ascii_hexdigit()),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_category(id: i64, name: &str) -> category::Model {
        category::Model {
            id,
            name: name.to_string(),
            icon: "fas fa-code".to_string(),
            color: "#ff0000".to_string(),
        }
    }

    fn service(db: MockDatabase) -> CategoryService {
        CategoryService::new(CategoryRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_is_valid_color() {
        assert!(is_valid_color("#fff"));
        assert!(is_valid_color("#3b2342"));
        assert!(is_valid_color("#ABCDEF"));

        assert!(!is_valid_color("3b2342"));
        assert!(!is_valid_color("#ff"));
        assert!(!is_valid_color("#3b23421"));
        assert!(!is_valid_color("#gggggg"));
        assert!(!is_valid_color(""));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_color() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(CreateCategoryInput {
                name: "Rust".to_string(),
                icon: None,
                color: Some("red".to_string()),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_long_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(CreateCategoryInput {
                name: "x".repeat(31),
                icon: None,
                color: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_all_with_counts() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_category(1, "Rust"),
                    create_test_category(2, "Travel"),
                ]])
                .append_query_results([[std::collections::BTreeMap::from([
                    ("category_id", sea_orm::Value::BigInt(Some(1))),
                    ("post_count", sea_orm::Value::BigInt(Some(4))),
                ])]]),
        );

        let categories = service.all_with_counts().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].post_count, 4);
        assert_eq!(categories[1].post_count, 0);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
        );

        match service.delete(3).await {
            Err(AppError::NotFound(msg)) => assert!(msg.contains('3')),
            _ => panic!("Expected NotFound error"),
        }
    }
}
