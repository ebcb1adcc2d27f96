//! API 请求/响应类型定义

use serde::{Deserialize, Serialize};

use crate::services::PreferenceSource;
use crate::storage::UserAccount;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// 登录/注册成功后的响应
#[derive(Serialize, Clone, Debug)]
pub struct AuthSuccessResponse {
    pub user: UserAccount,
    /// Bearer 客户端可直接使用；浏览器走 HttpOnly Cookie
    pub access_token: String,
    pub expires_in: u64,
}

/// `GET /api/articles` 查询参数
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ArticleListQuery {
    pub categoria: Option<String>,
    pub autor: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// `false` 时忽略个性化偏好
    pub personalize: Option<bool>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

/// `?date=YYYY-MM-DD`
#[derive(Deserialize, Clone, Debug, Default)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct VoteRequest {
    pub option_id: i64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct FeedbackListQuery {
    pub pending: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AnsweredRequest {
    #[serde(default = "default_true")]
    pub answered: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Clone, Debug)]
pub struct PreferenceResponse {
    pub source: PreferenceSource,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct RankingResponse<T> {
    pub date: chrono::NaiveDate,
    pub entries: Vec<T>,
}

// ============ 健康检查相关类型 ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u32,
}
