//! 会话认证
//!
//! 会话令牌来自 `Authorization: Bearer` 或 `jcpe_session` Cookie。
//! `SessionUser` 作为提取器使用：必须登录的端点直接取 `SessionUser`，
//! 可选登录的端点取 `Option<SessionUser>`。

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::{Method, StatusCode, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants;
use crate::api::jwt::get_jwt_service;
use crate::api::services::admin::{ErrorCode, error_response};

/// 已认证的会话
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub is_staff: bool,
}

/// 从 Authorization header 提取 Bearer token
fn extract_bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

fn validate_token(token: &str) -> Option<SessionUser> {
    match get_jwt_service().validate_access_token(token) {
        Ok(claims) => {
            let id = claims.user_id()?;
            trace!("Session token valid for user {}", id);
            Some(SessionUser {
                id,
                is_staff: claims.staff,
            })
        }
        Err(e) => {
            debug!("Session token rejected: {}", e);
            None
        }
    }
}

/// 解析请求携带的会话（Bearer 优先，其次 Cookie）
pub fn session_from_request(req: &HttpRequest) -> Option<SessionUser> {
    if let Some(user) = req.extensions().get::<SessionUser>() {
        return Some(*user);
    }

    if let Some(token) = extract_bearer_token(req)
        && let Some(user) = validate_token(&token)
    {
        return Some(user);
    }

    req.cookie(constants::SESSION_COOKIE_NAME)
        .and_then(|c| validate_token(c.value()))
}

fn unauthorized_response() -> HttpResponse {
    error_response(
        StatusCode::UNAUTHORIZED,
        ErrorCode::Unauthorized,
        "Faça login para continuar.",
    )
}

impl FromRequest for SessionUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(match session_from_request(req) {
            Some(user) => Ok(user),
            None => Err(InternalError::from_response("missing session", unauthorized_response()).into()),
        })
    }
}

/// 管理后台认证中间件：要求 staff 会话
#[derive(Clone)]
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Admin authentication failed - invalid or missing session");
        req.into_response(unauthorized_response().map_into_right_body())
    }

    fn handle_forbidden(req: ServiceRequest, user: SessionUser) -> ServiceResponse<EitherBody<B>> {
        info!("Admin access denied for non-staff user {}", user.id);
        req.into_response(
            error_response(
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "Acesso restrito à equipe editorial.",
            )
            .map_into_right_body(),
        )
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            match session_from_request(req.request()) {
                Some(user) if user.is_staff => {
                    trace!("Admin authentication successful for user {}", user.id);
                    req.extensions_mut().insert(user);
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                Some(user) => Ok(Self::handle_forbidden(req, user)),
                None => Ok(Self::handle_unauthorized(req)),
            }
        })
    }
}
