//! API 模块常量定义
//!
//! 会话与偏好 Cookie 名称。

/// 会话 Access Token Cookie 名称（HttpOnly）
pub const SESSION_COOKIE_NAME: &str = "jcpe_session";

/// 匿名读者偏好 Cookie 名称
pub const PREFS_COOKIE_NAME: &str = "jcpe_prefs";

/// 偏好 Cookie 有效期（天）
pub const PREFS_COOKIE_DAYS: i64 = 365;
