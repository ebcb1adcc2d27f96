//! API 帮助函数：统一响应、Cookie、multipart 解析

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use chrono::NaiveDate;
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, error};

use crate::api::constants;
use crate::errors::{PortalError, Result};

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 PortalError 构建错误响应；表单错误的字段明细放在 `data`
pub fn error_from_portal(err: &PortalError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("API request failed: {}", err);
    } else {
        debug!("API request rejected: {}", err);
    }

    let code = ErrorCode::from(err);
    match err.field_errors() {
        Some(fields) => json_response(status, code, err.message(), Some(fields)),
        None => error_response(status, code, err.message()),
    }
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_portal(&e),
    }
}

/// `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        PortalError::date_parse(format!("Data inválida '{}': use o formato AAAA-MM-DD", value))
    })
}

/// Cookie 构建器
pub struct CookieBuilder {
    secure: bool,
    access_token_minutes: u64,
}

impl CookieBuilder {
    pub fn from_config() -> Self {
        let auth = &crate::config::get_config().auth;
        Self {
            secure: auth.cookie_secure,
            access_token_minutes: auth.access_token_minutes,
        }
    }

    fn build_cookie_base(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age: CookieDuration,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(http_only);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(max_age);
        cookie
    }

    pub fn build_session_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::SESSION_COOKIE_NAME,
            token,
            true,
            CookieDuration::minutes(self.access_token_minutes as i64),
        )
    }

    pub fn build_expired_session_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::SESSION_COOKIE_NAME,
            String::new(),
            true,
            CookieDuration::ZERO,
        )
    }

    /// 偏好 Cookie 前端也需要读取，不设 HttpOnly
    pub fn build_prefs_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::PREFS_COOKIE_NAME,
            token,
            false,
            CookieDuration::days(constants::PREFS_COOKIE_DAYS),
        )
    }
}

/// 解析后的 multipart 表单：文本字段 + 一个可选文件
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<Vec<u8>>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// 读取 multipart 请求体；`file_field` 之外的字段按 UTF-8 文本读取
pub async fn read_multipart(
    payload: &mut Multipart,
    file_field: &str,
    max_file_bytes: usize,
) -> Result<MultipartForm> {
    // 文本字段上限
    const MAX_TEXT_BYTES: usize = 64 * 1024;

    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            PortalError::validation(format!("Dados multipart inválidos: {}", e))
        })?;
        let name = field.name().unwrap_or("").to_string();
        let is_file = name == file_field;
        let limit = if is_file { max_file_bytes } else { MAX_TEXT_BYTES };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk.map_err(|e| {
                PortalError::validation(format!("Falha ao ler o envio: {}", e))
            })?;
            if data.len() + bytes.len() > limit {
                return Err(if is_file {
                    PortalError::invalid_image(format!(
                        "Imagem maior que o limite de {} MB.",
                        max_file_bytes / 1024 / 1024
                    ))
                } else {
                    PortalError::validation(format!("Campo '{}' muito grande.", name))
                });
            }
            data.extend_from_slice(&bytes);
        }

        if is_file {
            if !data.is_empty() {
                form.file = Some(data);
            }
        } else if !name.is_empty() {
            form.fields
                .insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-09").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert!(matches!(parse_date("09/03/2024"), Err(PortalError::DateParse(_))));
    }

    #[test]
    fn test_error_statuses() {
        let response = error_from_portal(&PortalError::already_voted("Você já votou nesta enquete."));
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = error_from_portal(&PortalError::invalid_field("email", "E-mail já registrado."));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = api_result::<u32>(Ok(1));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
