//! 正文抽取
//!
//! 按优先级尝试一组 CSS 选择器，取命中容器内的 `<p>` 段落。
//! `script`、`nav`、`footer` 等区域内的段落不参与抽取。

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::IngestConfig;

/// 段落最短长度（字符），不超过该长度的段落被丢弃
const MIN_PARAGRAPH_CHARS: usize = 40;

const BOILERPLATE_PREFIX: &str = "Leia também";

const IGNORED_TAGS: [&str; 9] = [
    "script", "style", "nav", "header", "footer", "aside", "iframe", "form", "button",
];

/// (选择器, 是否为宽泛容器)。宽泛容器至少要有三个段落才算命中。
const BODY_SELECTORS: [(&str, bool); 15] = [
    (".mc-article-body", false),
    (".content-text", false),
    (".article-body", false),
    (".post-content", false),
    (".entry-content", false),
    ("[itemprop=\"articleBody\"]", false),
    ("article p", false),
    ("article", true),
    ("[class*=\"article-content\"]", false),
    ("[class*=\"post-body\"]", false),
    ("[class*=\"story-body\"]", false),
    ("[class*=\"texto\"]", false),
    ("[class*=\"materia\"]", false),
    ("main article", true),
    ("main", true),
];

static SELECTORS: Lazy<Vec<(Selector, bool)>> = Lazy::new(|| {
    BODY_SELECTORS
        .iter()
        .map(|(css, container)| (Selector::parse(css).expect("valid body selector"), *container))
        .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// 抽取结果的长度约束
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// 结果必须严格长于该值
    pub min_chars: usize,
    /// 超出部分截断并追加 `...`
    pub max_chars: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            min_chars: 300,
            max_chars: 8000,
        }
    }
}

impl ExtractLimits {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            min_chars: config.min_scraped_chars,
            max_chars: config.max_content_chars,
        }
    }
}

fn is_ignored(element: ElementRef<'_>) -> bool {
    if IGNORED_TAGS.contains(&element.value().name()) {
        return true;
    }
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| IGNORED_TAGS.contains(&e.name()))
    })
}

fn paragraphs_of(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element
        .select(&PARAGRAPH)
        .filter(|p| !is_ignored(*p))
        .collect()
}

/// 选择器直接命中 `<p>` 时（如 `article p`），全部命中段落即为正文
fn matched_paragraphs<'a>(document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
    document
        .select(selector)
        .filter(|el| el.value().name() == "p" && !is_ignored(*el))
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn join_paragraphs(paragraphs: &[ElementRef<'_>], limits: &ExtractLimits) -> Option<String> {
    let texts: Vec<String> = paragraphs
        .iter()
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS && !t.starts_with(BOILERPLATE_PREFIX))
        .collect();

    let joined = texts.join("\n\n");
    let joined = BLANK_LINES.replace_all(&joined, "\n\n");
    let joined = SPACES.replace_all(&joined, " ");
    let body = truncate_chars(&joined, limits.max_chars);

    (body.chars().count() > limits.min_chars).then_some(body)
}

/// 从文章页面 HTML 中抽取正文；找不到足够长的正文时返回 `None`
pub fn extract_article_body(html: &str, limits: &ExtractLimits) -> Option<String> {
    let document = Html::parse_document(html);

    for (selector, container) in SELECTORS.iter() {
        let Some(found) = document.select(selector).find(|el| !is_ignored(*el)) else {
            continue;
        };
        let paragraphs = if found.value().name() == "p" {
            matched_paragraphs(&document, selector)
        } else {
            paragraphs_of(found)
        };
        if *container && paragraphs.len() <= 2 {
            continue;
        }
        return join_paragraphs(&paragraphs, limits);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(n: usize) -> String {
        format!(
            "<p>Parágrafo {} da reportagem sobre o trânsito no Recife, com detalhes suficientes para passar do limite mínimo de tamanho.</p>",
            n
        )
    }

    fn page(body: &str) -> String {
        format!("<html><head><title>x</title></head><body>{}</body></html>", body)
    }

    #[test]
    fn test_specific_selector_wins() {
        let html = page(&format!(
            "<div class=\"article-body\">{}{}{}</div><main>{}</main>",
            paragraph(1),
            paragraph(2),
            paragraph(3),
            paragraph(9)
        ));
        let body = extract_article_body(&html, &ExtractLimits::default()).unwrap();
        assert!(body.starts_with("Parágrafo 1"));
        assert!(!body.contains("Parágrafo 9"));
        assert_eq!(body.split("\n\n").count(), 3);
    }

    #[test]
    fn test_boilerplate_and_short_paragraphs_dropped() {
        let html = page(&format!(
            "<div class=\"content-text\">{}<p>Curto demais.</p><p>Leia também: outra matéria muito interessante sobre o mesmo assunto no portal</p>{}{}</div>",
            paragraph(1),
            paragraph(2),
            paragraph(3)
        ));
        let body = extract_article_body(&html, &ExtractLimits::default()).unwrap();
        assert!(!body.contains("Curto demais"));
        assert!(!body.contains("Leia também"));
    }

    #[test]
    fn test_ignored_regions() {
        let html = page(&format!(
            "<article>{}{}<aside>{}</aside>{}</article>",
            paragraph(1),
            paragraph(2),
            paragraph(7),
            paragraph(3)
        ));
        let body = extract_article_body(&html, &ExtractLimits::default()).unwrap();
        assert!(!body.contains("Parágrafo 7"));
    }

    #[test]
    fn test_plain_article_collects_every_paragraph() {
        let html = page(&format!(
            "<header><p>Portal JC, notícias de Pernambuco e do Brasil em tempo real</p></header><article><h1>Título</h1>{}{}{}{}</article>",
            paragraph(1),
            paragraph(2),
            paragraph(3),
            paragraph(4)
        ));
        let body = extract_article_body(&html, &ExtractLimits::default()).unwrap();
        assert!(body.starts_with("Parágrafo 1"));
        assert!(body.contains("Parágrafo 4"));
        assert!(!body.contains("Portal JC"));
        assert_eq!(body.split("\n\n").count(), 4);
    }

    #[test]
    fn test_container_needs_three_paragraphs() {
        let html = page(&format!("<main>{}{}</main>", paragraph(1), paragraph(2)));
        assert!(extract_article_body(&html, &ExtractLimits::default()).is_none());
    }

    #[test]
    fn test_short_result_rejected() {
        let html = page(&format!("<div class=\"post-content\">{}</div>", paragraph(1)));
        assert!(extract_article_body(&html, &ExtractLimits::default()).is_none());
    }

    #[test]
    fn test_truncation() {
        let limits = ExtractLimits {
            min_chars: 10,
            max_chars: 50,
        };
        let html = page(&format!("<div class=\"entry-content\">{}</div>", paragraph(1)));
        let body = extract_article_body(&html, &limits).unwrap();
        assert!(body.ends_with("..."));
        assert_eq!(body.chars().count(), 53);
    }

    #[test]
    fn test_collapses_spaces() {
        let html = page(&format!(
            "<div class=\"entry-content\"><p>Texto   com    espaços     repetidos que precisa passar dos quarenta caracteres.</p>{}{}</div>",
            paragraph(1),
            paragraph(2)
        ));
        let body = extract_article_body(&html, &ExtractLimits::default()).unwrap();
        assert!(body.starts_with("Texto com espaços repetidos"));
    }
}
