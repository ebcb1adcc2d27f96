//! 访问记录与日榜快照
//!
//! `view_events` 的 (article_id, ip_address, day) 唯一索引保证同一访客
//! 当天只记一次；日榜在事务中整体替换。

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{CaseStatement, Expr, OnConflict, Query, UpdateStatement},
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::retry::InsertOutcome;
use crate::errors::Result;
use crate::storage::models::{RankingEntry, ViewCount};

use migration::entities::{article, daily_ranking, view_event};

/// 日榜按块写入，避免单条语句超出 SQLite 的绑定参数上限
const RANKING_CHUNK: usize = 500;

/// 一条 UPDATE 给一块上榜文章写入各自的名次（CASE WHEN）
fn stamp_ranks(day: NaiveDate, chunk: &[RankingEntry]) -> UpdateStatement {
    let mut ranks = CaseStatement::new();
    for entry in chunk {
        ranks = ranks.case(
            article::Column::Id.eq(entry.article_id),
            Expr::val(entry.rank),
        );
    }
    ranks = ranks.finally(Expr::col(article::Column::DailyRank));

    Query::update()
        .table(article::Entity)
        .value(article::Column::DailyRank, ranks)
        .value(article::Column::DailyRankDate, Expr::val(day))
        .and_where(article::Column::Id.is_in(chunk.iter().map(|e| e.article_id)))
        .to_owned()
}

#[derive(Debug, FromQueryResult)]
struct ViewCountRow {
    article_id: i64,
    views: i64,
}

impl SeaOrmStorage {
    /// 写入一条访问记录，同一 (文章, IP, 日) 已存在时不做任何事
    pub async fn insert_view_event(
        &self,
        article_id: i64,
        ip_address: &str,
        day: NaiveDate,
        viewed_at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let db = &self.db;

        let outcome = self
            .retry
            .insert_once(&format!("insert_view_event({})", article_id), || async {
                let model = view_event::ActiveModel {
                    article_id: Set(article_id),
                    ip_address: Set(ip_address.to_string()),
                    day: Set(day),
                    viewed_at: Set(viewed_at),
                    ..Default::default()
                };
                view_event::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            view_event::Column::ArticleId,
                            view_event::Column::IpAddress,
                            view_event::Column::Day,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(db)
                    .await
            })
            .await?;

        debug!(
            "View event article={} day={} -> {:?}",
            article_id, day, outcome
        );
        Ok(outcome)
    }

    /// 某篇文章某日的独立访客数
    pub async fn count_unique_views(&self, article_id: i64, day: NaiveDate) -> Result<u64> {
        let count = view_event::Entity::find()
            .filter(view_event::Column::ArticleId.eq(article_id))
            .filter(view_event::Column::Day.eq(day))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// 按独立访客数降序（同票按文章 ID 升序）聚合某日的访问
    pub async fn view_counts_for_day(
        &self,
        day: NaiveDate,
        limit: Option<u64>,
    ) -> Result<Vec<ViewCount>> {
        let mut query = view_event::Entity::find()
            .select_only()
            .column(view_event::Column::ArticleId)
            .column_as(view_event::Column::Id.count(), "views")
            .filter(view_event::Column::Day.eq(day))
            .group_by(view_event::Column::ArticleId)
            .order_by_desc(Expr::cust("views"))
            .order_by_asc(view_event::Column::ArticleId);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query.into_model::<ViewCountRow>().all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|r| ViewCount {
                article_id: r.article_id,
                views: r.views,
            })
            .collect())
    }

    /// 用新的名次整体替换某日的日榜
    ///
    /// 同一事务内删除旧快照并清除当天的名次标记，
    /// 再分块写入新快照、给上榜文章打上名次。
    pub async fn replace_daily_ranking(
        &self,
        day: NaiveDate,
        entries: &[RankingEntry],
    ) -> Result<()> {
        let db = &self.db;

        self.retry.run(
            &format!("replace_daily_ranking({})", day),
            || async {
                let txn = db.begin().await?;

                daily_ranking::Entity::delete_many()
                    .filter(daily_ranking::Column::Day.eq(day))
                    .exec(&txn)
                    .await?;

                for chunk in entries.chunks(RANKING_CHUNK) {
                    let models = chunk.iter().map(|e| daily_ranking::ActiveModel {
                        article_id: Set(e.article_id),
                        day: Set(day),
                        views: Set(e.views),
                        rank: Set(e.rank),
                        ..Default::default()
                    });
                    daily_ranking::Entity::insert_many(models)
                        .exec_without_returning(&txn)
                        .await?;
                }

                article::Entity::update_many()
                    .col_expr(article::Column::DailyRank, Expr::value(Option::<i32>::None))
                    .col_expr(
                        article::Column::DailyRankDate,
                        Expr::value(Option::<NaiveDate>::None),
                    )
                    .filter(article::Column::DailyRankDate.eq(day))
                    .exec(&txn)
                    .await?;

                for chunk in entries.chunks(RANKING_CHUNK) {
                    txn.execute(&stamp_ranks(day, chunk)).await?;
                }

                txn.commit().await
            },
        )
        .await?;

        info!("Daily ranking for {} stored ({} entries)", day, entries.len());
        Ok(())
    }

    /// 读取某日已保存的日榜（按名次）
    pub async fn ranking_for_day(&self, day: NaiveDate) -> Result<Vec<RankingEntry>> {
        let rows = daily_ranking::Entity::find()
            .filter(daily_ranking::Column::Day.eq(day))
            .order_by_asc(daily_ranking::Column::Rank)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| RankingEntry {
                article_id: m.article_id,
                day: m.day,
                views: m.views,
                rank: m.rank,
            })
            .collect())
    }
}
