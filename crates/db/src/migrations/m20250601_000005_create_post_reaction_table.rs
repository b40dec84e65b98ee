//! Create post reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostReaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostReaction::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostReaction::PostId).big_integer().not_null())
                    .col(
                        ColumnDef::new(PostReaction::IpAddress)
                            .string_len(45)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PostReaction::IsLike).boolean().not_null())
                    .col(
                        ColumnDef::new(PostReaction::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reaction_post")
                            .from(PostReaction::Table, PostReaction::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, ip_address) - one reaction per address per post
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reaction_post_ip")
                    .table(PostReaction::Table)
                    .col(PostReaction::PostId)
                    .col(PostReaction::IpAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostReaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostReaction {
    Table,
    Id,
    PostId,
    IpAddress,
    IsLike,
    CreatedOn,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
