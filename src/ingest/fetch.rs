//! 外部 HTTP 访问：文章页面抓取与图片下载

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::extract::{ExtractLimits, extract_article_body};
use crate::config::IngestConfig;
use crate::errors::{PortalError, Result};

/// 带统一 User-Agent 与超时的 HTTP 客户端
pub fn build_client(config: &IngestConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(PortalError::from)
}

/// 抓取原文页面并抽取正文；任何失败都只记录日志并返回 `None`
pub async fn fetch_article_text(client: &Client, url: &str, limits: &ExtractLimits) -> Option<String> {
    if url.is_empty() || url::Url::parse(url).is_err() {
        return None;
    }

    let html = match client.get(url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to read page body from {}: {}", url, e);
                return None;
            }
        },
        Err(e) => {
            warn!("Failed to fetch {}: {}", url, e);
            return None;
        }
    };

    let body = extract_article_body(&html, limits);
    match &body {
        Some(text) => debug!("Extracted {} chars from {}", text.chars().count(), url),
        None => debug!("No article body found at {}", url),
    }
    body
}

/// 下载图片原始字节
pub async fn download_image(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}
