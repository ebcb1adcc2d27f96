//! HTTP 层：读者 API、编辑后台 API、健康检查与中间件

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;
