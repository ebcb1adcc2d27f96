//! 投票与读者反馈表迁移
//!
//! votes 表没有 (poll, ip) 唯一约束，重复投票由服务层检查。

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_content_tables::Articles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Polls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Polls::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Polls::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Polls::Question).text().not_null())
                    .col(
                        ColumnDef::new(Polls::ArticleId)
                            .big_integer()
                            .null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_polls_article")
                            .from(Polls::Table, Polls::ArticleId)
                            .to(Articles::Table, Articles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PollOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollOptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollOptions::PollId).big_integer().not_null())
                    .col(ColumnDef::new(PollOptions::Text).string_len(200).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_options_poll")
                            .from(PollOptions::Table, PollOptions::PollId)
                            .to(Polls::Table, Polls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::OptionId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::IpAddress).string_len(45).not_null())
                    .col(
                        ColumnDef::new(Votes::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_option")
                            .from(Votes::Table, Votes::OptionId)
                            .to(PollOptions::Table, PollOptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_votes_option_ip")
                    .table(Votes::Table)
                    .col(Votes::OptionId)
                    .col(Votes::IpAddress)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedback::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedback::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Feedback::Email).string_len(254).not_null())
                    .col(ColumnDef::new(Feedback::Rating).small_integer().not_null())
                    .col(ColumnDef::new(Feedback::Comment).text().null())
                    .col(ColumnDef::new(Feedback::Image).string_len(255).null())
                    .col(
                        ColumnDef::new(Feedback::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Feedback::Answered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PollOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Polls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Polls {
    #[sea_orm(iden = "polls")]
    Table,
    Id,
    Title,
    Question,
    ArticleId,
}

#[derive(DeriveIden)]
enum PollOptions {
    #[sea_orm(iden = "poll_options")]
    Table,
    Id,
    PollId,
    Text,
}

#[derive(DeriveIden)]
enum Votes {
    #[sea_orm(iden = "votes")]
    Table,
    Id,
    OptionId,
    IpAddress,
    VotedAt,
}

#[derive(DeriveIden)]
enum Feedback {
    #[sea_orm(iden = "feedback")]
    Table,
    Id,
    Name,
    Email,
    Rating,
    Comment,
    Image,
    SentAt,
    Answered,
}
