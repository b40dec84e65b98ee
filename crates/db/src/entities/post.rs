//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post entity - a blog article.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    /// Post ID.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Post title.
    pub title: String,

    /// Post content.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Main image reference (path or URL).
    #[sea_orm(nullable)]
    pub image: Option<String>,

    /// Like count (denormalized from `post_reaction`).
    #[sea_orm(default_value = 0)]
    pub likes: i32,

    /// Dislike count (denormalized from `post_reaction`).
    #[sea_orm(default_value = 0)]
    pub dislikes: i32,

    /// Number of detail fetches.
    #[sea_orm(default_value = 0)]
    pub views: i32,

    /// Shown prominently on the front page.
    #[sea_orm(default_value = false)]
    pub featured: bool,

    /// When the post was created.
    pub created_on: DateTimeWithTimeZone,

    /// When the post was last changed.
    pub last_modified: DateTimeWithTimeZone,
}

/// Post relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Comments on the post.
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    /// Visitor reactions.
    #[sea_orm(has_many = "super::post_reaction::Entity")]
    PostReaction,

    /// Category links.
    #[sea_orm(has_many = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::post_reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostReaction.def()
    }
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_category::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
