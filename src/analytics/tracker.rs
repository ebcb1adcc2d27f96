use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use tracing::{debug, info, instrument};

use super::{ViewOutcome, calendar_day, rank_counts};
use crate::config::get_config;
use crate::errors::Result;
use crate::storage::{InsertOutcome, RankedArticle, RankingEntry, SeaOrmStorage};

/// 访问记录与日榜计算
pub struct ViewAnalytics {
    storage: Arc<SeaOrmStorage>,
    utc_offset_minutes: i32,
    /// (日期, 数量) -> 热门列表
    most_read_cache: Cache<(NaiveDate, u64), Arc<Vec<RankedArticle>>>,
}

impl ViewAnalytics {
    pub fn new(storage: Arc<SeaOrmStorage>, utc_offset_minutes: i32, cache_ttl: Duration) -> Self {
        Self {
            storage,
            utc_offset_minutes,
            most_read_cache: Cache::builder()
                .time_to_live(cache_ttl)
                .max_capacity(64)
                .build(),
        }
    }

    pub fn from_config(storage: Arc<SeaOrmStorage>) -> Self {
        let site = &get_config().site;
        Self::new(
            storage,
            site.utc_offset_minutes,
            Duration::from_secs(site.most_read_cache_secs),
        )
    }

    pub fn calendar_day(&self, when: DateTime<Utc>) -> NaiveDate {
        calendar_day(when, self.utc_offset_minutes)
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar_day(Utc::now())
    }

    /// 前一个自然日（`ranking` 命令的默认日期）
    pub fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }

    /// 记录一次访问；同一 IP 同一天重复访问同一篇文章不会新增记录
    pub async fn record_view(
        &self,
        article_id: i64,
        ip_address: &str,
        when: DateTime<Utc>,
    ) -> Result<ViewOutcome> {
        let day = self.calendar_day(when);
        let outcome = self
            .storage
            .insert_view_event(article_id, ip_address, day, when)
            .await?;

        Ok(match outcome {
            InsertOutcome::Inserted => ViewOutcome::Recorded,
            InsertOutcome::Duplicate => ViewOutcome::Duplicate,
        })
    }

    pub async fn count_unique_views(&self, article_id: i64, day: NaiveDate) -> Result<u64> {
        self.storage.count_unique_views(article_id, day).await
    }

    /// 某日访客最多的文章（带短 TTL 缓存）
    pub async fn most_viewed(&self, day: NaiveDate, limit: u64) -> Result<Vec<RankedArticle>> {
        let key = (day, limit);
        if let Some(cached) = self.most_read_cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let counts = self.storage.view_counts_for_day(day, Some(limit)).await?;
        let ranked = self.attach_articles(rank_counts(counts, day)).await?;

        self.most_read_cache
            .insert(key, Arc::new(ranked.clone()))
            .await;
        Ok(ranked)
    }

    /// 计算并保存某日的日榜，重复执行结果一致
    #[instrument(skip(self), fields(day = %day))]
    pub async fn compute_daily_ranking(&self, day: NaiveDate) -> Result<Vec<RankingEntry>> {
        let counts = self.storage.view_counts_for_day(day, None).await?;
        debug!("{} articles had views", counts.len());

        let entries = rank_counts(counts, day);
        self.storage.replace_daily_ranking(day, &entries).await?;

        info!("Daily ranking computed: {} entries", entries.len());
        Ok(entries)
    }

    /// 读取已保存的日榜
    pub async fn ranking_for(&self, day: NaiveDate) -> Result<Vec<RankedArticle>> {
        let entries = self.storage.ranking_for_day(day).await?;
        self.attach_articles(entries).await
    }

    async fn attach_articles(&self, entries: Vec<RankingEntry>) -> Result<Vec<RankedArticle>> {
        let ids: Vec<i64> = entries.iter().map(|e| e.article_id).collect();
        let mut summaries = self.storage.summaries_by_ids(&ids).await?;

        Ok(entries
            .into_iter()
            .filter_map(|e| {
                summaries.remove(&e.article_id).map(|article| RankedArticle {
                    rank: e.rank,
                    views: e.views,
                    article,
                })
            })
            .collect())
    }
}
