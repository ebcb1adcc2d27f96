//! 访问统计与日榜
//!
//! 原始访问记录（每个访客每天每篇一次）在这里被聚合成
//! “今日热门”与按日保存的排行快照。

pub mod ranking;
pub mod tracker;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

pub use ranking::rank_counts;
pub use tracker::ViewAnalytics;

/// 一次访问的记录结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// 当天首次访问，已写入
    Recorded,
    /// 同一 IP 当天已访问过
    Duplicate,
}

/// 带时区偏移的自然日
pub fn calendar_day(when: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (when + TimeDelta::minutes(i64::from(utc_offset_minutes))).date_naive()
}
