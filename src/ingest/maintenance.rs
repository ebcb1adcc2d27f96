//! 数据清理与正文长度报告

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use strum::AsRefStr;
use tracing::{debug, info, warn};

use super::refresh::main_text;
use crate::errors::Result;
use crate::services::{EditorialService, MediaStore};
use crate::storage::SeaOrmStorage;

/// 报告只看最新的若干篇
pub const REPORT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CleanupReason {
    MissingImage,
    TruncatedText,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupCandidate {
    pub id: i64,
    pub title: String,
    pub reason: CleanupReason,
}

/// 正文（尾注之前）含省略号视为截断
pub fn has_truncated_text(body: &str) -> bool {
    let text = main_text(body);
    text.contains("...") || text.contains("[...]")
}

/// 缺图（或图片文件丢失）与正文被截断的文章，每篇只列一次
pub async fn find_cleanup_candidates(
    storage: &Arc<SeaOrmStorage>,
    media: &MediaStore,
) -> Result<Vec<CleanupCandidate>> {
    let mut found: BTreeMap<i64, CleanupCandidate> = BTreeMap::new();

    for row in storage.article_bodies(None).await? {
        let image_ok = match row.image.as_deref() {
            Some(path) if !path.is_empty() => media.exists(path).await,
            _ => false,
        };
        let reason = if !image_ok {
            CleanupReason::MissingImage
        } else if has_truncated_text(&row.body) {
            CleanupReason::TruncatedText
        } else {
            continue;
        };
        found.insert(
            row.id,
            CleanupCandidate {
                id: row.id,
                title: row.title,
                reason,
            },
        );
    }

    Ok(found.into_values().collect())
}

/// 删除候选文章；单篇失败记录后继续
pub async fn delete_candidates(
    editorial: &EditorialService,
    candidates: &[CleanupCandidate],
) -> usize {
    let mut deleted = 0;
    for candidate in candidates {
        match editorial.delete_article(candidate.id).await {
            Ok(()) => {
                debug!("Deleted article {} ({})", candidate.id, candidate.reason.as_ref());
                deleted += 1;
            }
            Err(e) => warn!("Failed to delete article {}: {}", candidate.id, e),
        }
    }
    info!("Cleanup removed {} of {} articles", deleted, candidates.len());
    deleted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SizeStatus {
    Ok,
    Warn,
    Short,
}

impl SizeStatus {
    pub fn from_chars(chars: usize) -> Self {
        if chars > 1000 {
            SizeStatus::Ok
        } else if chars > 500 {
            SizeStatus::Warn
        } else {
            SizeStatus::Short
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeEntry {
    pub id: i64,
    pub title: String,
    pub body_chars: usize,
    pub status: SizeStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    pub entries: Vec<SizeEntry>,
    pub total: u64,
}

pub async fn size_report(storage: &Arc<SeaOrmStorage>) -> Result<SizeReport> {
    let entries = storage
        .article_bodies(Some(REPORT_LIMIT))
        .await?
        .into_iter()
        .map(|row| {
            let body_chars = main_text(&row.body).chars().count();
            SizeEntry {
                id: row.id,
                title: row.title,
                body_chars,
                status: SizeStatus::from_chars(body_chars),
            }
        })
        .collect();

    Ok(SizeReport {
        entries,
        total: storage.count_articles().await?,
    })
}
