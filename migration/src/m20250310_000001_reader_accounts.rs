//! 读者账户、收藏与偏好表迁移

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_content_tables::{Articles, Categories, Tags};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SavedArticles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedArticles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedArticles::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SavedArticles::ArticleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavedArticles::SavedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_articles_user")
                            .from(SavedArticles::Table, SavedArticles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_articles_article")
                            .from(SavedArticles::Table, SavedArticles::ArticleId)
                            .to(Articles::Table, Articles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_saved_articles_unique")
                    .table(SavedArticles::Table)
                    .col(SavedArticles::UserId)
                    .col(SavedArticles::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserCategoryPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCategoryPreferences::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserCategoryPreferences::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCategoryPreferences::CategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_category_prefs_user")
                            .from(
                                UserCategoryPreferences::Table,
                                UserCategoryPreferences::UserId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_category_prefs_category")
                            .from(
                                UserCategoryPreferences::Table,
                                UserCategoryPreferences::CategoryId,
                            )
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_category_prefs_unique")
                    .table(UserCategoryPreferences::Table)
                    .col(UserCategoryPreferences::UserId)
                    .col(UserCategoryPreferences::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserTagPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTagPreferences::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserTagPreferences::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserTagPreferences::TagId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_tag_prefs_user")
                            .from(UserTagPreferences::Table, UserTagPreferences::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_tag_prefs_tag")
                            .from(UserTagPreferences::Table, UserTagPreferences::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_tag_prefs_unique")
                    .table(UserTagPreferences::Table)
                    .col(UserTagPreferences::UserId)
                    .col(UserTagPreferences::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserTagPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCategoryPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavedArticles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    IsStaff,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SavedArticles {
    #[sea_orm(iden = "saved_articles")]
    Table,
    Id,
    UserId,
    ArticleId,
    SavedAt,
}

#[derive(DeriveIden)]
enum UserCategoryPreferences {
    #[sea_orm(iden = "user_category_preferences")]
    Table,
    Id,
    UserId,
    CategoryId,
}

#[derive(DeriveIden)]
enum UserTagPreferences {
    #[sea_orm(iden = "user_tag_preferences")]
    Table,
    Id,
    UserId,
    TagId,
}
