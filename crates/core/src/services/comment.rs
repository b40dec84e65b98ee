//! Comment service.

use blog_common::{AppError, AppResult};
use blog_db::entities::comment;
use blog_db::repositories::{CommentFilter, CommentRepository, PostRepository};
use chrono::Utc;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;

/// Minimum author length after trimming.
pub const AUTHOR_MIN_CHARS: usize = 2;
/// Maximum author length after trimming.
pub const AUTHOR_MAX_CHARS: usize = 60;
/// Maximum body length after trimming.
pub const BODY_MAX_CHARS: usize = 1000;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap());

/// A visitor-submitted comment, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    /// Display name.
    #[serde(default)]
    pub author: String,
    /// Comment text.
    #[serde(default)]
    pub body: String,
    /// Optional contact address.
    #[serde(default)]
    pub email: Option<String>,
}

/// A comment whose fields passed validation, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    /// Trimmed display name.
    pub author: String,
    /// Trimmed comment text.
    pub body: String,
    /// Contact address, if non-empty.
    pub email: Option<String>,
}

impl NewComment {
    /// Check the fields in order and report the first failure.
    pub fn validate(&self) -> AppResult<ValidComment> {
        let author = self.author.trim();
        let body = self.body.trim();
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());

        let author_len = author.chars().count();
        if author_len == 0 {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if author_len < AUTHOR_MIN_CHARS {
            return Err(AppError::Validation(format!(
                "Name must be at least {AUTHOR_MIN_CHARS} characters"
            )));
        }
        if author_len > AUTHOR_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "Name cannot exceed {AUTHOR_MAX_CHARS} characters"
            )));
        }

        if body.is_empty() {
            return Err(AppError::Validation("Comment is required".to_string()));
        }
        if body.chars().count() > BODY_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "Comment cannot exceed {BODY_MAX_CHARS} characters"
            )));
        }

        if let Some(email) = email {
            if !EMAIL_RE.is_match(email) {
                return Err(AppError::Validation("Invalid email address".to_string()));
            }
        }

        Ok(ValidComment {
            author: author.to_string(),
            body: body.to_string(),
            email: email.map(str::to_string),
        })
    }
}

/// Service for visitor comments and their moderation.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    /// Validate and append a comment to a post.
    pub async fn add(
        &self,
        post_id: i64,
        input: &NewComment,
        ip_address: Option<String>,
    ) -> AppResult<comment::Model> {
        let valid = input.validate()?;

        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(AppError::PostNotFound(post_id));
        }

        let model = comment::ActiveModel {
            post_id: Set(post_id),
            author: Set(valid.author),
            body: Set(valid.body),
            email: Set(valid.email),
            ip_address: Set(ip_address),
            is_featured: Set(false),
            created_on: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = self.comment_repo.create(model).await?;
        info!(comment_id = created.id, post_id, "Comment added");
        Ok(created)
    }

    /// Comments of a post, featured first, then newest first.
    pub async fn for_post(&self, post_id: i64) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_by_post(post_id).await
    }

    /// One page of comments for the back office, with the total match count.
    pub async fn list(
        &self,
        filter: &CommentFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<comment::Model>, u64)> {
        let comments = self.comment_repo.find_page(filter, offset, limit).await?;
        let total = self.comment_repo.count(filter).await?;
        Ok((comments, total))
    }

    /// Feature or unfeature comments. Returns the number updated.
    pub async fn set_featured(&self, ids: &[i64], featured: bool) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let updated = self.comment_repo.set_featured(ids, featured).await?;
        info!(count = updated, featured, "Comments featured flag updated");
        Ok(updated)
    }

    /// Delete a comment.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.comment_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Comment {id}")));
        }
        info!(comment_id = id, "Comment deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blog_db::entities::post;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn input(author: &str, body: &str, email: Option<&str>) -> NewComment {
        NewComment {
            author: author.to_string(),
            body: body.to_string(),
            email: email.map(str::to_string),
        }
    }

    fn validation_message(result: AppResult<ValidComment>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    fn create_test_post(id: i64) -> post::Model {
        let now = Utc::now().into();
        post::Model {
            id,
            title: "Hello".to_string(),
            body: "world".to_string(),
            image: None,
            likes: 0,
            dislikes: 0,
            views: 0,
            featured: false,
            created_on: now,
            last_modified: now,
        }
    }

    fn service(db: MockDatabase) -> CommentService {
        let conn = Arc::new(db.into_connection());
        CommentService::new(
            CommentRepository::new(Arc::clone(&conn)),
            PostRepository::new(conn),
        )
    }

    #[test]
    fn test_author_length_bounds() {
        let msg = validation_message(input("A", "Great read", None).validate());
        assert!(msg.contains("at least 2"));

        assert!(input("Al", "Great read", None).validate().is_ok());
        assert!(input(&"x".repeat(60), "ok", None).validate().is_ok());

        let msg = validation_message(input(&"x".repeat(61), "ok", None).validate());
        assert!(msg.contains("60"));
    }

    #[test]
    fn test_author_is_trimmed() {
        let msg = validation_message(input("  A  ", "Great read", None).validate());
        assert!(msg.contains("at least 2"));

        let valid = input("  Alice ", "  Hi there ", None).validate().unwrap();
        assert_eq!(valid.author, "Alice");
        assert_eq!(valid.body, "Hi there");
    }

    #[test]
    fn test_body_bounds() {
        let msg = validation_message(input("Alice", "   ", None).validate());
        assert_eq!(msg, "Comment is required");

        assert!(input("Alice", &"b".repeat(1000), None).validate().is_ok());

        let msg = validation_message(input("Alice", &"b".repeat(1001), None).validate());
        assert!(msg.contains("1000"));
    }

    #[test]
    fn test_first_failure_is_reported() {
        let msg = validation_message(input("", "", Some("nope")).validate());
        assert_eq!(msg, "Name is required");
    }

    #[test]
    fn test_email_format() {
        assert!(input("Alice", "Hi", Some("a@b.co")).validate().is_ok());
        assert_eq!(
            input("Alice", "Hi", Some("  ")).validate().unwrap().email,
            None
        );

        for bad in ["plain", "a@b", "@b.co", "a@@b.co"] {
            let msg = validation_message(input("Alice", "Hi", Some(bad)).validate());
            assert_eq!(msg, "Invalid email address", "{bad}");
        }
    }

    #[tokio::test]
    async fn test_add_to_missing_post() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        let result = service.add(5, &input("Alice", "Hi", None), None).await;
        match result {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, 5),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_add_validates_before_lookup() {
        // No query results appended: a lookup would fail with a database error.
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.add(5, &input("A", "Hi", None), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_stamps_address() {
        let stored = comment::Model {
            id: 11,
            post_id: 1,
            author: "Alice".to_string(),
            body: "Hi".to_string(),
            email: None,
            ip_address: Some("203.0.113.9".to_string()),
            is_featured: false,
            created_on: Utc::now().into(),
        };
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(1)]])
                .append_query_results([[stored]]),
        );

        let created = service
            .add(
                1,
                &input("Alice", "Hi", None),
                Some("203.0.113.9".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(created.id, 11);
        assert_eq!(created.ip_address.as_deref(), Some("203.0.113.9"));
    }
}
