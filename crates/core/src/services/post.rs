//! Post service: listings, search, detail and back-office management.

use std::collections::HashMap;
use std::sync::Arc;

use blog_common::{AppError, AppResult};
use blog_db::entities::{category, comment, post, post_reaction::Sentiment};
use blog_db::repositories::{
    CategoryRepository, CommentRepository, PostFilter, PostOrder, PostReactionRepository,
    PostRepository,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};
use validator::Validate;

use crate::metrics::{engagement_ratio, reading_time};

/// Featured posts shown on the index page.
pub const FEATURED_ON_INDEX: u64 = 3;

/// Maximum number of live search results.
pub const LIVE_SEARCH_LIMIT: u64 = 10;

/// Live search queries shorter than this (after trimming) return nothing.
pub const LIVE_SEARCH_MIN_CHARS: usize = 2;

/// Page number and row offset for a 1-based `page`.
///
/// The page is clamped so that the offset always fits in a signed 64-bit
/// bind parameter.
#[must_use]
pub const fn page_window(page: Option<u64>, per_page: u64) -> (u64, u64) {
    let per_page = if per_page == 0 { 1 } else { per_page };
    let last = match i64::MAX as u64 / per_page {
        0 => 1,
        n => n,
    };
    let number = match page {
        Some(n) if n > last => last,
        Some(n) if n > 1 => n,
        _ => 1,
    };
    (number, (number - 1) * per_page)
}

/// Query parameters of the public listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Substring of title, body or category name.
    pub search: Option<String>,
    /// Sort token from the allow-list.
    pub order: Option<String>,
    /// Page number, starting at 1.
    pub page: Option<u64>,
}

/// Query parameters of the back-office post list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPostQuery {
    /// Substring of title or body.
    pub search: Option<String>,
    /// Featured flag.
    pub featured: Option<bool>,
    /// Linked category.
    pub category_id: Option<i64>,
    /// Page number, starting at 1.
    pub page: Option<u64>,
}

/// A post with its categories.
#[derive(Debug, Clone, PartialEq)]
pub struct PostWithCategories {
    /// The post.
    pub post: post::Model,
    /// Its categories.
    pub categories: Vec<category::Model>,
}

impl PostWithCategories {
    /// Estimated reading time in minutes.
    #[must_use]
    pub fn reading_time(&self) -> u32 {
        reading_time(&self.post.body)
    }

    /// Percentage of reactions that are likes.
    #[must_use]
    pub fn engagement_ratio(&self) -> f64 {
        engagement_ratio(self.post.likes, self.post.dislikes)
    }
}

/// One page of a post listing.
#[derive(Debug, Clone)]
pub struct PostPage {
    /// Posts on this page.
    pub posts: Vec<PostWithCategories>,
    /// Current page, starting at 1.
    pub page: u64,
    /// Rows per page.
    pub per_page: u64,
    /// Matching posts.
    pub total: u64,
    /// Order in effect.
    pub order: PostOrder,
    /// Search term in effect.
    pub search: Option<String>,
}

impl PostPage {
    /// Number of pages, at least 1.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }
}

/// The front page: a listing plus site-wide aggregates.
#[derive(Debug, Clone)]
pub struct IndexPage {
    /// The listing.
    pub listing: PostPage,
    /// Featured posts, newest first.
    pub featured: Vec<PostWithCategories>,
    /// All categories.
    pub categories: Vec<category::Model>,
    /// Number of posts.
    pub total_posts: u64,
    /// Views across all posts.
    pub total_views: i64,
}

/// Posts of the categories matching a name fragment.
#[derive(Debug, Clone)]
pub struct CategoryPage {
    /// Requested name fragment.
    pub name: String,
    /// First category matching the fragment.
    pub category: Option<category::Model>,
    /// The listing.
    pub listing: PostPage,
    /// All categories.
    pub categories: Vec<category::Model>,
}

/// Everything shown on a post's page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    /// The post, with the counted view.
    pub post: post::Model,
    /// Its categories.
    pub categories: Vec<category::Model>,
    /// Comments, featured first.
    pub comments: Vec<comment::Model>,
    /// The visitor's reaction.
    pub user_reaction: Option<Sentiment>,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    /// Percentage of reactions that are likes.
    pub engagement_ratio: f64,
    /// All categories.
    pub all_categories: Vec<category::Model>,
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    /// Post title.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Post content.
    #[validate(length(min = 1))]
    pub body: String,
    /// Main image reference.
    #[validate(length(max = 1024))]
    pub image: Option<String>,
    /// Show on the front page.
    #[serde(default)]
    pub featured: bool,
    /// Categories to link.
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Input for updating a post. Absent fields are left unchanged; `image: null` clears the image.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    /// New title.
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    /// New content.
    #[validate(length(min = 1))]
    pub body: Option<String>,
    /// New image reference.
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    /// New featured flag.
    pub featured: Option<bool>,
    /// Replacement category links.
    pub category_ids: Option<Vec<i64>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    category_repo: CategoryRepository,
    comment_repo: CommentRepository,
    reaction_repo: PostReactionRepository,
    page_size: u64,
}

impl PostService {
    /// Create a new post service listing `page_size` posts per page.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, page_size: u64) -> Self {
        Self {
            post_repo: PostRepository::new(Arc::clone(&db)),
            category_repo: CategoryRepository::new(Arc::clone(&db)),
            comment_repo: CommentRepository::new(Arc::clone(&db)),
            reaction_repo: PostReactionRepository::new(Arc::clone(&db)),
            page_size: page_size.max(1),
            db,
        }
    }

    /// The front page.
    pub async fn index(&self, query: &ListQuery) -> AppResult<IndexPage> {
        let listing = self.list(query).await?;
        let featured = self.post_repo.find_featured(FEATURED_ON_INDEX).await?;
        let featured = self.attach_categories(featured).await?;
        let categories = self.category_repo.find_all().await?;
        let total_posts = self.post_repo.count(&PostFilter::default()).await?;
        let total_views = self.post_repo.total_views().await?;

        Ok(IndexPage {
            listing,
            featured,
            categories,
            total_posts,
            total_views,
        })
    }

    /// The public listing: optional search over title, body and category name.
    pub async fn list(&self, query: &ListQuery) -> AppResult<PostPage> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let filter = PostFilter {
            search: search.clone(),
            search_categories: true,
            ..Default::default()
        };

        let order = PostOrder::from_token(query.order.as_deref());
        self.page(&filter, order, query.page, search).await
    }

    /// Posts linked to any category whose name contains `name`, newest first.
    pub async fn by_category(&self, name: &str, page: Option<u64>) -> AppResult<CategoryPage> {
        let filter = PostFilter {
            category_name: Some(name.to_string()),
            ..Default::default()
        };

        let listing = self.page(&filter, PostOrder::Newest, page, None).await?;
        let category = self.category_repo.find_first_name_containing(name).await?;
        let categories = self.category_repo.find_all().await?;

        Ok(CategoryPage {
            name: name.to_string(),
            category,
            listing,
            categories,
        })
    }

    /// Count a view and load the post's page.
    pub async fn view(&self, id: i64, ip_address: Option<&str>) -> AppResult<PostDetail> {
        if !self.post_repo.increment_views(id).await? {
            return Err(AppError::PostNotFound(id));
        }
        debug!(post_id = id, "View counted");

        let post = self
            .post_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))?;

        let categories = self.category_repo.find_for_post(id).await?;
        let comments = self.comment_repo.find_by_post(id).await?;
        let user_reaction = match ip_address {
            Some(ip) => self.reaction_repo.sentiment_of(id, ip).await?,
            None => None,
        };
        let all_categories = self.category_repo.find_all().await?;

        Ok(PostDetail {
            reading_time: reading_time(&post.body),
            engagement_ratio: engagement_ratio(post.likes, post.dislikes),
            post,
            categories,
            comments,
            user_reaction,
            all_categories,
        })
    }

    /// Typeahead search. Short queries return nothing without touching the store.
    pub async fn live_search(&self, query: &str) -> AppResult<Vec<PostWithCategories>> {
        let query = query.trim();
        if query.chars().count() < LIVE_SEARCH_MIN_CHARS {
            return Ok(vec![]);
        }

        let filter = PostFilter {
            search: Some(query.to_string()),
            search_categories: true,
            ..Default::default()
        };
        let posts = self
            .post_repo
            .find_page(&filter, PostOrder::Newest, 0, LIVE_SEARCH_LIMIT)
            .await?;
        self.attach_categories(posts).await
    }

    /// Back-office listing: search over title and body, featured and category filters.
    pub async fn admin_list(&self, query: &AdminPostQuery) -> AppResult<PostPage> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let filter = PostFilter {
            search: search.clone(),
            search_categories: false,
            category_name: None,
            category_id: query.category_id,
            featured: query.featured,
        };

        self.page(&filter, PostOrder::Newest, query.page, search)
            .await
    }

    /// Get a post with its categories, without counting a view.
    pub async fn get(&self, id: i64) -> AppResult<PostWithCategories> {
        let post = self
            .post_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))?;
        let categories = self.category_repo.find_for_post(id).await?;
        Ok(PostWithCategories { post, categories })
    }

    /// Create a post.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<PostWithCategories> {
        input.validate()?;
        self.ensure_categories_exist(&input.category_ids).await?;

        let now = Utc::now();
        let model = post::ActiveModel {
            title: Set(input.title),
            body: Set(input.body),
            image: Set(input.image.filter(|i| !i.is_empty())),
            likes: Set(0),
            dislikes: Set(0),
            views: Set(0),
            featured: Set(input.featured),
            created_on: Set(now.into()),
            last_modified: Set(now.into()),
            ..Default::default()
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let created = PostRepository::create(&txn, model).await?;
        CategoryRepository::set_post_categories(&txn, created.id, &input.category_ids).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(post_id = created.id, title = %created.title, "Post created");
        self.get(created.id).await
    }

    /// Update a post.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> AppResult<PostWithCategories> {
        input.validate()?;
        if let Some(ref ids) = input.category_ids {
            self.ensure_categories_exist(ids).await?;
        }

        let existing = self
            .post_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))?;
        let mut active: post::ActiveModel = existing.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(body) = input.body {
            active.body = Set(body);
        }
        if let Some(image) = input.image {
            active.image = Set(image.filter(|i| !i.is_empty()));
        }
        if let Some(featured) = input.featured {
            active.featured = Set(featured);
        }
        active.last_modified = Set(Utc::now().into());

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        PostRepository::update(&txn, active).await?;
        if let Some(ref ids) = input.category_ids {
            CategoryRepository::set_post_categories(&txn, id, ids).await?;
        }
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(post_id = id, "Post updated");
        self.get(id).await
    }

    /// Delete a post with its comments, reactions and category links.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.post_repo.delete(id).await? {
            return Err(AppError::PostNotFound(id));
        }
        info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// Feature or unfeature posts. Returns the number updated.
    pub async fn set_featured(&self, ids: &[i64], featured: bool) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let updated = self.post_repo.set_featured(ids, featured).await?;
        info!(count = updated, featured, "Posts featured flag updated");
        Ok(updated)
    }

    async fn page(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: Option<u64>,
        search: Option<String>,
    ) -> AppResult<PostPage> {
        let (page, offset) = page_window(page, self.page_size);

        let total = self.post_repo.count(filter).await?;
        let posts = self
            .post_repo
            .find_page(filter, order, offset, self.page_size)
            .await?;

        Ok(PostPage {
            posts: self.attach_categories(posts).await?,
            page,
            per_page: self.page_size,
            total,
            order,
            search,
        })
    }

    async fn attach_categories(
        &self,
        posts: Vec<post::Model>,
    ) -> AppResult<Vec<PostWithCategories>> {
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut by_post: HashMap<i64, Vec<category::Model>> =
            self.category_repo.find_for_posts(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| PostWithCategories {
                categories: by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    async fn ensure_categories_exist(&self, ids: &[i64]) -> AppResult<()> {
        let mut wanted = ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let found = self.category_repo.find_by_ids(&wanted).await?;
        if found.len() != wanted.len() {
            return Err(AppError::Validation("Unknown category".to_string()));
        }
        Ok(())
    }
}
