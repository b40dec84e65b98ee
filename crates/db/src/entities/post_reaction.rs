//! Post reaction entity (one like/dislike per visitor address per post).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A visitor's sentiment toward a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Thumbs up.
    Like,
    /// Thumbs down.
    Dislike,
}

impl Sentiment {
    /// Map the stored `is_like` flag to a sentiment.
    #[must_use]
    pub const fn from_is_like(is_like: bool) -> Self {
        if is_like { Self::Like } else { Self::Dislike }
    }

    /// The stored `is_like` flag for this sentiment.
    #[must_use]
    pub const fn is_like(self) -> bool {
        matches!(self, Self::Like)
    }
}

/// Post reaction entity - one visitor's like or dislike.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_reaction")]
pub struct Model {
    /// Reaction ID.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The post being reacted to.
    pub post_id: i64,

    /// Visitor address; unique together with `post_id`.
    pub ip_address: String,

    /// true = like, false = dislike.
    pub is_like: bool,

    /// When the reaction was first recorded.
    pub created_on: DateTimeWithTimeZone,
}

impl Model {
    /// The sentiment this row records.
    #[must_use]
    pub const fn sentiment(&self) -> Sentiment {
        Sentiment::from_is_like(self.is_like)
    }
}

/// Post reaction relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The reacted post.
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
