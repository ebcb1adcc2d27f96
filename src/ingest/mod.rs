//! 内容导入与维护命令
//!
//! 独立于 Web 层运行，由 CLI 调用：
//! - `pipeline`：NewsAPI 导入
//! - `extract`：文章页面正文抽取
//! - `refresh`：重新抓取已导入文章
//! - `maintenance`：清理与长度报告
//! - `seed`：固定分类表

pub mod extract;
pub mod fetch;
pub mod maintenance;
pub mod newsapi;
pub mod pipeline;
pub mod refresh;
pub mod seed;

pub use extract::{ExtractLimits, extract_article_body};
pub use fetch::build_client;
pub use maintenance::{
    CleanupCandidate, CleanupReason, SizeReport, SizeStatus, delete_candidates,
    find_cleanup_candidates, size_report,
};
pub use newsapi::NewsApiClient;
pub use pipeline::{ImportReport, NewsImporter};
pub use refresh::{RefreshReport, refresh_articles};
pub use seed::{EDITORIAL_CATEGORIES, SeedReport, seed_categories};
