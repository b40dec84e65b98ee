//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Comment entity - a visitor's comment on a post.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    /// Comment ID.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Post the comment belongs to.
    #[sea_orm(indexed)]
    pub post_id: i64,

    /// Display name of the commenter.
    pub author: String,

    /// Comment text.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Optional contact address for replies.
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// Origin address of the request that created the comment.
    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    /// Pinned above the other comments by an administrator.
    #[sea_orm(default_value = false)]
    pub is_featured: bool,

    /// When the comment was posted.
    pub created_on: DateTimeWithTimeZone,
}

impl Model {
    /// Short preview of the body for listings.
    #[must_use]
    pub fn short_body(&self) -> String {
        if self.body.chars().count() > 100 {
            let head: String = self.body.chars().take(100).collect();
            format!("{head}...")
        } else {
            self.body.clone()
        }
    }
}

/// Comment relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The commented post.
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
