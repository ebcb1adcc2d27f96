use chrono::NaiveDate;

use crate::storage::{RankingEntry, ViewCount};

/// 把某日的访客计数排成名次
///
/// 访客数降序，同票时文章 ID 小者在前；名次严格为 1..N，不并列。
/// 访客数为 0 的文章不上榜。
pub fn rank_counts(mut counts: Vec<ViewCount>, day: NaiveDate) -> Vec<RankingEntry> {
    counts.retain(|c| c.views > 0);
    counts.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then_with(|| a.article_id.cmp(&b.article_id))
    });

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, c)| RankingEntry {
            article_id: c.article_id,
            day,
            views: c.views,
            rank: idx as i32 + 1,
        })
        .collect()
}
