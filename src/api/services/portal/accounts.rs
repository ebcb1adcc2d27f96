//! 读者账户端点：注册、登录、登出、当前用户

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::api::jwt::get_jwt_service;
use crate::api::middleware::SessionUser;
use crate::api::services::admin::{
    ApiResponse, AuthSuccessResponse, CookieBuilder, ErrorCode, LoginCredentials,
    MessageResponse, error_from_portal, error_response, success_response,
};
use crate::errors::PortalError;
use crate::services::{AccountService, RegisterForm};
use crate::storage::UserAccount;
use crate::utils::client_ip;

/// 登录限流 key：解析后的客户端 IP（可信代理规则与访问统计一致）
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        Ok(client_ip(req.request()))
    }
}

/// 创建登录限流器
///
/// 每秒补充 1 个令牌，突发最多 5 次；超限返回 429
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 签发会话并写入 Cookie
fn session_response(user: UserAccount, status: StatusCode) -> HttpResponse {
    let jwt_service = get_jwt_service();
    let token = match jwt_service.generate_access_token(user.id, user.is_staff) {
        Ok(token) => token,
        Err(e) => {
            error!("Portal API: failed to generate access token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Falha ao iniciar a sessão.",
            );
        }
    };

    let cookie_builder = CookieBuilder::from_config();
    HttpResponse::build(status)
        .cookie(cookie_builder.build_session_cookie(token.clone()))
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: Some(AuthSuccessResponse {
                user,
                access_token: token,
                expires_in: jwt_service.access_token_minutes() * 60,
            }),
        })
}

/// POST /api/auth/register（注册后直接登录）
pub async fn register(
    form: web::Json<RegisterForm>,
    accounts: web::Data<Arc<AccountService>>,
) -> ActixResult<impl Responder> {
    match accounts.register(form.into_inner()).await {
        Ok(user) => Ok(session_response(user, StatusCode::CREATED)),
        Err(e) => Ok(error_from_portal(&e)),
    }
}

/// POST /api/auth/login
pub async fn login(
    credentials: web::Json<LoginCredentials>,
    accounts: web::Data<Arc<AccountService>>,
) -> ActixResult<impl Responder> {
    match accounts
        .authenticate(&credentials.email, &credentials.password)
        .await
    {
        Ok(user) => {
            info!("Portal API: login successful for user {}", user.id);
            Ok(session_response(user, StatusCode::OK))
        }
        Err(e) => {
            info!("Portal API: login failed");
            Ok(error_from_portal(&e))
        }
    }
}

/// POST /api/auth/logout - 清除会话 Cookie
pub async fn logout() -> ActixResult<impl Responder> {
    let cookie_builder = CookieBuilder::from_config();
    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_expired_session_cookie())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: Some(MessageResponse {
                message: "Sessão encerrada.".to_string(),
            }),
        }))
}

/// GET /api/auth/me
pub async fn me(
    session: SessionUser,
    accounts: web::Data<Arc<AccountService>>,
) -> ActixResult<impl Responder> {
    match accounts.find(session.id).await {
        Ok(Some(user)) => Ok(success_response(user)),
        // 令牌有效但账户已不存在
        Ok(None) => Ok(error_from_portal(&PortalError::unauthorized(
            "Sessão inválida.",
        ))),
        Err(e) => Ok(error_from_portal(&e)),
    }
}
