//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::PortalError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 内容错误
/// - 4000-4099: 投票错误
/// - 5000-5099: 上传错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,

    // 内容错误 3000-3099
    InvalidForm = 3000,
    DatabaseError = 3005,
    UpstreamError = 3010,

    // 投票错误 4000-4099
    AlreadyVoted = 4000,
    InvalidOption = 4001,

    // 上传错误 5000-5099
    InvalidImage = 5000,
}

impl From<&PortalError> for ErrorCode {
    fn from(err: &PortalError) -> Self {
        match err {
            PortalError::Validation(_) => ErrorCode::BadRequest,
            PortalError::InvalidForm(_) => ErrorCode::InvalidForm,
            PortalError::NotFound(_) => ErrorCode::NotFound,
            PortalError::Conflict(_) => ErrorCode::Conflict,
            PortalError::Unauthorized(_) => ErrorCode::AuthFailed,
            PortalError::Forbidden(_) => ErrorCode::Forbidden,
            PortalError::AlreadyVoted(_) => ErrorCode::AlreadyVoted,
            PortalError::InvalidOption(_) => ErrorCode::InvalidOption,
            PortalError::DateParse(_) => ErrorCode::InvalidDateFormat,
            PortalError::Upstream(_) => ErrorCode::UpstreamError,
            PortalError::InvalidImage(_) => ErrorCode::InvalidImage,
            PortalError::DatabaseConfig(_)
            | PortalError::DatabaseConnection(_)
            | PortalError::DatabaseOperation(_) => ErrorCode::DatabaseError,
            PortalError::FileOperation(_) | PortalError::Serialization(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::AlreadyVoted).unwrap(), "4000");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_maps_portal_errors() {
        assert_eq!(
            ErrorCode::from(&PortalError::already_voted("x")),
            ErrorCode::AlreadyVoted
        );
        assert_eq!(
            ErrorCode::from(&PortalError::invalid_field("email", "x")),
            ErrorCode::InvalidForm
        );
    }
}
