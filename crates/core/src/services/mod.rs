//! Business logic services.

pub mod category;
pub mod comment;
pub mod post;
pub mod reaction;

pub use category::{CategoryService, CategoryWithCount, CreateCategoryInput, UpdateCategoryInput};
pub use comment::{CommentService, NewComment, ValidComment};
pub use post::{
    AdminPostQuery, CategoryPage, CreatePostInput, IndexPage, ListQuery, PostDetail, PostPage,
    PostService, PostWithCategories, UpdatePostInput, page_window,
};
pub use reaction::{ReactionAction, ReactionOutcome, ReactionPlan, ReactionService, plan};
