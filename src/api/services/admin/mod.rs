//! Admin API 服务模块（`/admin/v1`，需要 staff 会话）
//!
//! 同时承载全站共用的响应信封、错误码与帮助函数。

mod articles;
mod dashboard;
pub mod error_code;
mod feedback;
mod helpers;
mod polls;
pub mod routes;
mod taxonomy;
mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    CookieBuilder, MultipartForm, api_result, created_response, error_from_portal,
    error_response, json_response, parse_date, read_multipart, success_response,
};

// 重新导出错误码
pub use error_code::ErrorCode;
