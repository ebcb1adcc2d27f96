//! 重新抓取已导入文章的原文，正文变长时替换（保留来源尾注）

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use super::extract::ExtractLimits;
use super::fetch::fetch_article_text;
use crate::errors::Result;
use crate::storage::SeaOrmStorage;

const FOOTER_MARKER: &str = "---";

static SOURCE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Leia o artigo completo: (https?://\S+)").expect("valid regex"));

/// 尾注中的原文链接
pub fn footer_url(body: &str) -> Option<&str> {
    SOURCE_URL
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// 尾注之前的正文
pub fn main_text(body: &str) -> &str {
    body.split(FOOTER_MARKER).next().unwrap_or(body)
}

/// 从第一个 `---\n` 开始的尾注
pub fn footer(body: &str) -> Option<&str> {
    body.find("---\n").map(|idx| &body[idx..])
}

/// 新正文 + 原尾注
pub fn replace_main_text(body: &str, new_text: &str) -> String {
    format!("{}\n\n{}", new_text, footer(body).unwrap_or_default())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub unchanged: usize,
    pub without_source: usize,
    pub total: usize,
}

pub async fn refresh_articles(
    storage: &Arc<SeaOrmStorage>,
    client: &Client,
    limits: &ExtractLimits,
) -> Result<RefreshReport> {
    let rows = storage.article_bodies(None).await?;
    let mut report = RefreshReport {
        total: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let Some(url) = footer_url(&row.body) else {
            report.without_source += 1;
            continue;
        };

        let current = main_text(&row.body).chars().count();
        match fetch_article_text(client, url, limits).await {
            Some(text) if text.chars().count() > current => {
                let body = replace_main_text(&row.body, &text);
                storage.update_article_body(row.id, &body).await?;
                info!(
                    "Article {} refreshed: {} -> {} chars",
                    row.id,
                    current,
                    text.chars().count()
                );
                report.updated += 1;
            }
            _ => {
                warn!("Article {} not refreshed (fetch failed or text not longer)", row.id);
                report.unchanged += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "Texto antigo.\n\n---\nAutor: Ana\nFonte: G1\nLeia o artigo completo: https://g1.globo.com/pe/noticia.ghtml";

    #[test]
    fn test_footer_url() {
        assert_eq!(footer_url(BODY), Some("https://g1.globo.com/pe/noticia.ghtml"));
        assert_eq!(footer_url("sem rodapé"), None);
    }

    #[test]
    fn test_replace_keeps_footer() {
        let updated = replace_main_text(BODY, "Texto novo e bem mais completo.");
        assert!(updated.starts_with("Texto novo e bem mais completo.\n\n---\nAutor: Ana"));
        assert!(updated.ends_with("noticia.ghtml"));
        assert_eq!(main_text(BODY), "Texto antigo.\n\n");
    }
}
