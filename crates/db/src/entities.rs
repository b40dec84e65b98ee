//! Database entities.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_category;
pub mod post_reaction;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use post::Entity as Post;
pub use post_category::Entity as PostCategory;
pub use post_reaction::Entity as PostReaction;
