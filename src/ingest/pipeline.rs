//! NewsAPI 导入流程
//!
//! 单篇文章失败只记录日志并跳过，不重试。图片下载或处理失败时删除刚插入的文章行。

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::extract::ExtractLimits;
use super::fetch::{download_image, fetch_article_text};
use super::newsapi::{
    CATEGORY_QUERIES, NewsApiArticle, NewsApiClient, clean_title, query_for, source_footer,
    strip_chars_marker, truncate_summary,
};
use crate::config::IngestConfig;
use crate::errors::Result;
use crate::services::EditorialService;
use crate::storage::{NewArticle, SeaOrmStorage};

/// 导入文章统一归属的作者
pub const NEWSAPI_AUTHOR: &str = "NewsAPI";

const TITLE_MAX_CHARS: usize = 200;

/// API 内容短于该长度时改用摘要
const MIN_API_CONTENT_CHARS: usize = 100;

const CONTENT_UNAVAILABLE: &str = "Conteúdo não disponível.";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Saved(i64),
    Skipped(&'static str),
}

/// 选定正文：抓取结果更长时优先，API 内容过短时退回摘要；
/// 最终不足 `min_chars` 返回 `None`
pub fn compose_body(
    api_content: &str,
    scraped: Option<String>,
    summary: &str,
    min_chars: usize,
) -> Option<String> {
    let mut content = strip_chars_marker(api_content);
    match scraped {
        Some(text) if text.chars().count() > content.chars().count() => content = text,
        _ if content.chars().count() < MIN_API_CONTENT_CHARS => {
            content = if summary.is_empty() {
                CONTENT_UNAVAILABLE.to_string()
            } else {
                summary.to_string()
            };
        }
        _ => {}
    }

    (content.chars().count() >= min_chars).then_some(content)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct NewsImporter {
    storage: Arc<SeaOrmStorage>,
    editorial: Arc<EditorialService>,
    client: Client,
    limits: ExtractLimits,
    min_content_chars: usize,
}

impl NewsImporter {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        editorial: Arc<EditorialService>,
        client: Client,
        config: &IngestConfig,
    ) -> Self {
        Self {
            storage,
            editorial,
            client,
            limits: ExtractLimits::from_config(config),
            min_content_chars: config.min_content_chars,
        }
    }

    /// 导入内置分类（或仅 `category`）的最新文章，每个分类最多 `limit` 篇
    pub async fn import(
        &self,
        api: &NewsApiClient,
        category: Option<&str>,
        limit: u32,
    ) -> Result<ImportReport> {
        let author = self.editorial.get_or_create_author(NEWSAPI_AUTHOR).await?;
        let targets: Vec<(&str, &str)> = match category {
            Some(name) => vec![(name, query_for(name))],
            None => CATEGORY_QUERIES.to_vec(),
        };

        let mut report = ImportReport::default();
        for (name, query) in targets {
            let (category, created) = self.editorial.get_or_create_category(name).await?;
            if created {
                info!("Category '{}' created for import", category.name);
            }

            let articles = match api.everything(query, limit).await {
                Ok(articles) => articles,
                Err(e) => {
                    warn!("NewsAPI request for '{}' failed: {}", name, e);
                    report.failed += 1;
                    continue;
                }
            };

            for article in articles {
                match self.import_article(article, category.id, author.id).await {
                    Ok(ImportOutcome::Saved(_)) => report.saved += 1,
                    Ok(ImportOutcome::Skipped(reason)) => {
                        debug!("Article skipped: {}", reason);
                        report.skipped += 1;
                    }
                    Err(e) => {
                        warn!("Article import failed: {}", e);
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            "NewsAPI import finished: {} saved, {} skipped, {} failed",
            report.saved, report.skipped, report.failed
        );
        Ok(report)
    }

    pub async fn import_article(
        &self,
        article: NewsApiArticle,
        category_id: i64,
        author_id: i64,
    ) -> Result<ImportOutcome> {
        let Some(raw_title) = non_empty(article.title) else {
            return Ok(ImportOutcome::Skipped("missing title"));
        };
        let title: String = clean_title(&raw_title).chars().take(TITLE_MAX_CHARS).collect();
        if title.is_empty() {
            return Ok(ImportOutcome::Skipped("missing title"));
        }
        if self.storage.article_title_exists(&title).await? {
            return Ok(ImportOutcome::Skipped("duplicate title"));
        }

        let summary = truncate_summary(article.description.as_deref().unwrap_or_default().trim());
        let url = article.url.unwrap_or_default();
        let scraped = fetch_article_text(&self.client, &url, &self.limits).await;

        let Some(mut body) = compose_body(
            article.content.as_deref().unwrap_or_default(),
            scraped,
            &summary,
            self.min_content_chars,
        ) else {
            return Ok(ImportOutcome::Skipped("content too short"));
        };

        let byline = non_empty(article.author).unwrap_or_else(|| "Desconhecido".to_string());
        let source = non_empty(article.source.and_then(|s| s.name))
            .unwrap_or_else(|| "Desconhecida".to_string());
        body.push_str(&source_footer(&byline, &source, &url));

        let Some(image_url) = non_empty(article.url_to_image) else {
            return Ok(ImportOutcome::Skipped("missing image"));
        };

        let slug = self.editorial.unique_article_slug(&title).await?;
        let id = self
            .storage
            .insert_article(&NewArticle {
                title: title.clone(),
                slug,
                summary: (!summary.is_empty()).then_some(summary),
                body,
                image: None,
                category_id: Some(category_id),
                author_id: Some(author_id),
                tag_ids: Vec::new(),
                published_at: Utc::now(),
            })
            .await?;

        let attached = match download_image(&self.client, &image_url).await {
            Ok(bytes) => self.editorial.upload_article_image(id, bytes).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = attached {
            warn!("Image for article {} unavailable ({}), removing article", id, e);
            self.storage.delete_article(id).await?;
            return Ok(ImportOutcome::Skipped("image unavailable"));
        }

        info!("Imported article {}: {}", id, title);
        Ok(ImportOutcome::Saved(id))
    }
}
