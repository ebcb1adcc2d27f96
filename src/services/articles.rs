//! Reader-facing article listing and detail

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::PollService;
use crate::analytics::{ViewAnalytics, ViewOutcome};
use crate::config::get_config;
use crate::errors::{PortalError, Result};
use crate::storage::{
    ArticleDetail, ArticleFilter, ArticleSummary, CategoryRef, Page, RankedArticle, SeaOrmStorage,
    TagRef,
};

pub const MAX_PAGE_SIZE: u64 = 100;

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`, falling back to the site default
pub fn effective_page_size(requested: Option<u64>, default: u64) -> u64 {
    requested
        .filter(|s| *s > 0)
        .unwrap_or(default)
        .clamp(1, MAX_PAGE_SIZE)
}

pub struct ArticleService {
    storage: Arc<SeaOrmStorage>,
    analytics: Arc<ViewAnalytics>,
    polls: PollService,
}

impl ArticleService {
    pub fn new(storage: Arc<SeaOrmStorage>, analytics: Arc<ViewAnalytics>) -> Self {
        Self {
            polls: PollService::new(storage.clone()),
            storage,
            analytics,
        }
    }

    pub async fn list(
        &self,
        filter: &ArticleFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<ArticleSummary>> {
        let size = effective_page_size(page_size, get_config().site.page_size);
        self.storage
            .list_articles(filter, page.unwrap_or(1).max(1), size)
            .await
    }

    /// Article detail; records one view for `ip_address` on today's calendar day
    pub async fn detail(&self, slug: &str, ip_address: &str) -> Result<ArticleDetail> {
        let mut detail = self
            .storage
            .find_article_by_slug(slug)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Notícia '{}' não encontrada", slug)))?;

        let article_id = detail.article.id;
        // 统计失败不影响阅读
        match self.analytics.record_view(article_id, ip_address, Utc::now()).await {
            Ok(ViewOutcome::Recorded) => debug!("View recorded: article={}", article_id),
            Ok(ViewOutcome::Duplicate) => {}
            Err(e) => warn!("Failed to record view for article {}: {}", article_id, e),
        }

        detail.poll = self.polls.tally_for_article(article_id).await?;
        Ok(detail)
    }

    /// Today's most viewed articles
    pub async fn most_read(&self, limit: Option<u64>) -> Result<Vec<RankedArticle>> {
        let limit = limit
            .unwrap_or(get_config().site.most_read_limit)
            .clamp(1, MAX_PAGE_SIZE);
        self.analytics.most_viewed(self.analytics.today(), limit).await
    }

    pub async fn categories(&self) -> Result<Vec<CategoryRef>> {
        self.storage.list_categories().await
    }

    pub async fn tags(&self) -> Result<Vec<TagRef>> {
        self.storage.list_tags().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_page_size() {
        assert_eq!(effective_page_size(None, 12), 12);
        assert_eq!(effective_page_size(Some(0), 12), 12);
        assert_eq!(effective_page_size(Some(30), 12), 30);
        assert_eq!(effective_page_size(Some(5000), 12), MAX_PAGE_SIZE);
    }
}
