//! Category entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Icon assigned to categories created without one.
pub const DEFAULT_ICON: &str = "fas fa-tag";

/// Color assigned to categories created without one.
pub const DEFAULT_COLOR: &str = "#3b2342";

/// Category entity - a label attached to posts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    /// Category ID.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display label (not unique).
    pub name: String,

    /// Icon identifier (e.g., "fas fa-code").
    pub icon: String,

    /// Hex color (e.g., "#3b2342").
    pub color: String,
}

/// Category relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Links to posts.
    #[sea_orm(has_many = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_category::Relation::Post.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
