use std::collections::BTreeMap;
use std::fmt;

use actix_web::http::StatusCode;

/// 表单字段错误：字段名 -> 错误消息列表
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub enum PortalError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    InvalidForm(FieldErrors),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    AlreadyVoted(String),
    InvalidOption(String),
    Serialization(String),
    DateParse(String),
    Upstream(String),
    InvalidImage(String),
}

impl PortalError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            PortalError::DatabaseConfig(_) => "E001",
            PortalError::DatabaseConnection(_) => "E002",
            PortalError::DatabaseOperation(_) => "E003",
            PortalError::FileOperation(_) => "E004",
            PortalError::Validation(_) => "E005",
            PortalError::InvalidForm(_) => "E006",
            PortalError::NotFound(_) => "E007",
            PortalError::Conflict(_) => "E008",
            PortalError::Unauthorized(_) => "E009",
            PortalError::Forbidden(_) => "E010",
            PortalError::AlreadyVoted(_) => "E011",
            PortalError::InvalidOption(_) => "E012",
            PortalError::Serialization(_) => "E013",
            PortalError::DateParse(_) => "E014",
            PortalError::Upstream(_) => "E015",
            PortalError::InvalidImage(_) => "E016",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            PortalError::DatabaseConfig(_) => "Database Configuration Error",
            PortalError::DatabaseConnection(_) => "Database Connection Error",
            PortalError::DatabaseOperation(_) => "Database Operation Error",
            PortalError::FileOperation(_) => "File Operation Error",
            PortalError::Validation(_) => "Validation Error",
            PortalError::InvalidForm(_) => "Invalid Form",
            PortalError::NotFound(_) => "Resource Not Found",
            PortalError::Conflict(_) => "Conflict",
            PortalError::Unauthorized(_) => "Unauthorized",
            PortalError::Forbidden(_) => "Forbidden",
            PortalError::AlreadyVoted(_) => "Already Voted",
            PortalError::InvalidOption(_) => "Invalid Poll Option",
            PortalError::Serialization(_) => "Serialization Error",
            PortalError::DateParse(_) => "Date Parse Error",
            PortalError::Upstream(_) => "Upstream Request Error",
            PortalError::InvalidImage(_) => "Invalid Image",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            PortalError::DatabaseConfig(msg)
            | PortalError::DatabaseConnection(msg)
            | PortalError::DatabaseOperation(msg)
            | PortalError::FileOperation(msg)
            | PortalError::Validation(msg)
            | PortalError::NotFound(msg)
            | PortalError::Conflict(msg)
            | PortalError::Unauthorized(msg)
            | PortalError::Forbidden(msg)
            | PortalError::AlreadyVoted(msg)
            | PortalError::InvalidOption(msg)
            | PortalError::Serialization(msg)
            | PortalError::DateParse(msg)
            | PortalError::Upstream(msg)
            | PortalError::InvalidImage(msg) => msg,
            PortalError::InvalidForm(_) => "Formulário inválido",
        }
    }

    /// 表单错误详情（仅 InvalidForm 有值）
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            PortalError::InvalidForm(errors) => Some(errors),
            _ => None,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            PortalError::Validation(_)
            | PortalError::InvalidForm(_)
            | PortalError::InvalidOption(_)
            | PortalError::InvalidImage(_)
            | PortalError::DateParse(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict(_) | PortalError::AlreadyVoted(_) => StatusCode::CONFLICT,
            PortalError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PortalError::DatabaseConfig(_)
            | PortalError::DatabaseConnection(_)
            | PortalError::DatabaseOperation(_)
            | PortalError::FileOperation(_)
            | PortalError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        match self {
            PortalError::InvalidForm(errors) => {
                let details: Vec<String> = errors
                    .iter()
                    .map(|(field, msgs)| format!("{}: {}", field, msgs.join("; ")))
                    .collect();
                format!("{}: {}", self.error_type(), details.join(", "))
            }
            _ => format!("{}: {}", self.error_type(), self.message()),
        }
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PortalError {}

// 便捷的构造函数
impl PortalError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        PortalError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        PortalError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        PortalError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        PortalError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        PortalError::Validation(msg.into())
    }

    /// 单字段表单错误
    pub fn invalid_field<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![msg.into()]);
        PortalError::InvalidForm(errors)
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        PortalError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        PortalError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        PortalError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        PortalError::Forbidden(msg.into())
    }

    pub fn already_voted<T: Into<String>>(msg: T) -> Self {
        PortalError::AlreadyVoted(msg.into())
    }

    pub fn invalid_option<T: Into<String>>(msg: T) -> Self {
        PortalError::InvalidOption(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        PortalError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        PortalError::DateParse(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        PortalError::Upstream(msg.into())
    }

    pub fn invalid_image<T: Into<String>>(msg: T) -> Self {
        PortalError::InvalidImage(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for PortalError {
    fn from(err: sea_orm::DbErr) -> Self {
        PortalError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for PortalError {
    fn from(err: chrono::ParseError) -> Self {
        PortalError::DateParse(err.to_string())
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Upstream(err.to_string())
    }
}

impl From<image::ImageError> for PortalError {
    fn from(err: image::ImageError) -> Self {
        PortalError::InvalidImage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for PortalError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errors) in errs.field_errors() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        PortalError::InvalidForm(fields)
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PortalError::already_voted("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PortalError::invalid_option("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_field_carries_message() {
        let err = PortalError::invalid_field("email", "E-mail já registrado.");
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["email"], vec!["E-mail já registrado.".to_string()]);
        assert!(err.format_simple().contains("email: E-mail já registrado."));
    }
}
