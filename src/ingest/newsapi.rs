//! NewsAPI.org `/v2/everything` 客户端与文章清洗规则

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{PortalError, Result};

/// 内置分类 → 检索词
pub const CATEGORY_QUERIES: [(&str, &str); 7] = [
    ("Economia", "economia brasil"),
    ("Esportes", "esportes brasil OR futebol brasil"),
    ("Tecnologia", "tecnologia brasil"),
    ("Política", "política brasil"),
    ("Cultura", "cultura brasil"),
    ("Geral", "brasil"),
    ("Pernambuco", "Pernambuco OR Recife"),
];

pub const SUMMARY_MAX_CHARS: usize = 300;

/// NewsAPI 在截断内容末尾追加的 `[+1234 chars]`
static CHARS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[\+\d+\s+chars?\]$").expect("valid regex"));

/// 分类对应的检索词；不在内置表中的分类直接用名称检索
pub fn query_for(category: &str) -> &str {
    CATEGORY_QUERIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, query)| *query)
        .unwrap_or(category)
}

/// 去掉标题末尾的 " - 来源" 后缀
pub fn clean_title(title: &str) -> String {
    title.split(" - ").next().unwrap_or(title).trim().to_string()
}

pub fn truncate_summary(description: &str) -> String {
    description.chars().take(SUMMARY_MAX_CHARS).collect()
}

pub fn strip_chars_marker(content: &str) -> String {
    CHARS_MARKER.replace(content, "").into_owned()
}

/// 文章尾部的来源信息；`ingest refresh` 依赖其中的原文链接
pub fn source_footer(author: &str, source: &str, url: &str) -> String {
    format!(
        "\n\n---\nAutor: {}\nFonte: {}\nLeia o artigo completo: {}",
        author, source, url
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    #[serde(default)]
    message: Option<String>,
}

pub struct NewsApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// 最新的葡语文章（按发布时间倒序）
    pub async fn everything(&self, query: &str, page_size: u32) -> Result<Vec<NewsApiArticle>> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = page_size.to_string();
        debug!("NewsAPI request: q='{}' pageSize={}", query, page_size);

        let response: EverythingResponse = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("q", query),
                ("language", "pt"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.status != "ok" {
            return Err(PortalError::upstream(format!(
                "NewsAPI error: {}",
                response.message.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        info!(
            "NewsAPI returned {} of {} results for '{}'",
            response.articles.len(),
            response.total_results,
            query
        );
        Ok(response.articles)
    }
}
