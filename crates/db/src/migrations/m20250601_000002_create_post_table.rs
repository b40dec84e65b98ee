//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Post::Body).text().not_null())
                    .col(ColumnDef::new(Post::Image).string_len(1024))
                    .col(ColumnDef::new(Post::Likes).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::Dislikes).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::Views).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::Featured).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Post::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Post::LastModified)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Post::Likes).gte(0))
                    .check(Expr::col(Post::Dislikes).gte(0))
                    .check(Expr::col(Post::Views).gte(0))
                    .to_owned(),
            )
            .await?;

        // Index: created_on (default listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_on")
                    .table(Post::Table)
                    .col(Post::CreatedOn)
                    .to_owned(),
            )
            .await?;

        // Index: featured (front page)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_featured")
                    .table(Post::Table)
                    .col(Post::Featured)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    Title,
    Body,
    Image,
    Likes,
    Dislikes,
    Views,
    Featured,
    CreatedOn,
    LastModified,
}
