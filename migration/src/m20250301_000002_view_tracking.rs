//! 浏览记录与日榜表迁移
//!
//! view_events 上的 (article_id, ip_address, day) 唯一索引保证
//! 同一 IP 同一天对同一篇文章只记一次。

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
                    .table(ViewEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ViewEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ViewEvents::ArticleId).big_integer().not_null())
                    .col(ColumnDef::new(ViewEvents::IpAddress).string_len(45).not_null())
                    .col(ColumnDef::new(ViewEvents::Day).date().not_null())
                    .col(
                        ColumnDef::new(ViewEvents::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_view_events_article")
                            .from(ViewEvents::Table, ViewEvents::ArticleId)
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
                    .name("idx_view_events_unique_visit")
                    .table(ViewEvents::Table)
                    .col(ViewEvents::ArticleId)
                    .col(ViewEvents::IpAddress)
                    .col(ViewEvents::Day)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按天聚合
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_view_events_day")
                    .table(ViewEvents::Table)
                    .col(ViewEvents::Day)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailyRankings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyRankings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailyRankings::ArticleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DailyRankings::Day).date().not_null())
                    .col(
                        ColumnDef::new(DailyRankings::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DailyRankings::Rank).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_rankings_article")
                            .from(DailyRankings::Table, DailyRankings::ArticleId)
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
                    .name("idx_daily_rankings_day_article")
                    .table(DailyRankings::Table)
                    .col(DailyRankings::Day)
                    .col(DailyRankings::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyRankings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ViewEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ViewEvents {
    #[sea_orm(iden = "view_events")]
    Table,
    Id,
    ArticleId,
    IpAddress,
    Day,
    ViewedAt,
}

#[derive(DeriveIden)]
enum DailyRankings {
    #[sea_orm(iden = "daily_rankings")]
    Table,
    Id,
    ArticleId,
    Day,
    Views,
    Rank,
}
