use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorInfo {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
}

/// 列表页使用的文章摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub category: Option<CategoryRef>,
    pub author: Option<AuthorInfo>,
    pub published_at: DateTime<Utc>,
    pub daily_rank: Option<i32>,
    pub daily_rank_date: Option<NaiveDate>,
}

/// 详情页：摘要 + 正文、标签、关联投票
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: ArticleSummary,
    pub body: String,
    pub tags: Vec<TagRef>,
    pub poll: Option<PollTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// 已解析为 ID 的个性化偏好
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceIds {
    pub category_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
}

impl PreferenceIds {
    pub fn is_empty(&self) -> bool {
        self.category_ids.is_empty() && self.tag_ids.is_empty()
    }
}

/// 文章列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// 分类 slug
    pub category: Option<String>,
    /// 作者 slug
    pub author: Option<String>,
    /// 标签名
    pub tag: Option<String>,
    /// 标题/摘要/正文模糊搜索
    pub search: Option<String>,
    /// 分类命中 或 任一标签命中
    pub preference: Option<PreferenceIds>,
}

/// 新建文章（slug 由调用方保证唯一）
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: String,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub published_at: DateTime<Utc>,
}

/// 文章可编辑字段（slug 与发布时间不可变）
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub tag_ids: Vec<i64>,
}

/// 单篇文章某日的独立访客数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCount {
    pub article_id: i64,
    pub views: i64,
}

/// 日榜条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub article_id: i64,
    pub day: NaiveDate,
    pub views: i64,
    pub rank: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedArticle {
    pub rank: i32,
    pub views: i64,
    pub article: ArticleSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionTally {
    pub id: i64,
    pub text: String,
    pub votes: i64,
    /// 占总票数百分比，保留一位小数
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollTally {
    pub poll_id: i64,
    pub title: String,
    pub question: String,
    pub article_id: Option<i64>,
    pub total_votes: i64,
    pub options: Vec<OptionTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    pub saved_at: DateTime<Utc>,
    pub article: ArticleSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub rating_label: String,
    pub comment: Option<String>,
    pub image: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub answered: bool,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub image: Option<String>,
}

/// 管理后台概览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub articles: u64,
    pub categories: u64,
    pub authors: u64,
    pub tags: u64,
    pub feedback_pending: u64,
    pub latest: Vec<ArticleSummary>,
}

/// 维护命令使用的文章精简视图
#[derive(Debug, Clone)]
pub struct ArticleBodyRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            items,
            page,
            page_size,
            total,
            total_pages,
        }
    }

    pub fn empty(page: u64, page_size: u64) -> Self {
        Self::new(Vec::new(), page, page_size, 0)
    }
}
