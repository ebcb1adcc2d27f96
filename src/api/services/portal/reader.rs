//! 读者个人功能：收藏与偏好

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::constants;
use crate::api::middleware::SessionUser;
use crate::api::services::admin::{
    ApiResponse, CookieBuilder, ErrorCode, MessageResponse, PreferenceResponse, api_result,
    error_from_portal, error_response, success_response,
};
use crate::services::{
    Preference, PreferenceSource, PersonalizationService, SavedArticleService, decode_token,
    encode_token,
};

/// POST /api/articles/{id}/save
pub async fn save_article(
    session: SessionUser,
    path: web::Path<i64>,
    saved: web::Data<Arc<SavedArticleService>>,
) -> ActixResult<impl Responder> {
    let article_id = path.into_inner();
    match saved.save(session.id, article_id).await {
        Ok(()) => Ok(success_response(MessageResponse {
            message: "Notícia salva.".to_string(),
        })),
        Err(e) => Ok(error_from_portal(&e)),
    }
}

/// DELETE /api/articles/{id}/save
pub async fn unsave_article(
    session: SessionUser,
    path: web::Path<i64>,
    saved: web::Data<Arc<SavedArticleService>>,
) -> ActixResult<impl Responder> {
    let article_id = path.into_inner();
    match saved.remove(session.id, article_id).await {
        Ok(true) => Ok(success_response(MessageResponse {
            message: "Notícia removida dos salvos.".to_string(),
        })),
        Ok(false) => Ok(error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            "Esta notícia não está nos seus salvos.",
        )),
        Err(e) => Ok(error_from_portal(&e)),
    }
}

/// GET /api/saved
pub async fn list_saved(
    session: SessionUser,
    saved: web::Data<Arc<SavedArticleService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(saved.list(session.id).await))
}

fn preference_response(source: PreferenceSource, pref: Preference) -> PreferenceResponse {
    PreferenceResponse {
        source,
        categories: pref.categories,
        tags: pref.tags,
    }
}

/// GET /api/preferences：账户偏好优先，其次 Cookie
pub async fn get_preferences(
    req: HttpRequest,
    session: Option<SessionUser>,
    personalization: web::Data<Arc<PersonalizationService>>,
) -> ActixResult<impl Responder> {
    if let Some(session) = session {
        match personalization.for_user(session.id).await {
            Ok(pref) if !pref.is_empty() => {
                return Ok(success_response(preference_response(
                    PreferenceSource::Account,
                    pref,
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_from_portal(&e)),
        }
    }

    let from_cookie = req
        .cookie(constants::PREFS_COOKIE_NAME)
        .and_then(|c| decode_token(c.value()))
        .filter(|p| !p.is_empty());

    Ok(success_response(match from_cookie {
        Some(pref) => preference_response(PreferenceSource::Token, pref),
        None => preference_response(PreferenceSource::None, Preference::default()),
    }))
}

/// PUT /api/preferences：登录时写入账户，否则写入 Cookie
pub async fn put_preferences(
    body: web::Json<Preference>,
    session: Option<SessionUser>,
    personalization: web::Data<Arc<PersonalizationService>>,
) -> ActixResult<impl Responder> {
    let pref = body.into_inner();

    if let Some(session) = session {
        return Ok(match personalization.save_for_user(session.id, pref).await {
            Ok(saved) => success_response(preference_response(PreferenceSource::Account, saved)),
            Err(e) => error_from_portal(&e),
        });
    }

    let pref = pref.normalized();
    let cookie = CookieBuilder::from_config().build_prefs_cookie(encode_token(&pref));
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: Some(preference_response(PreferenceSource::Token, pref)),
        }))
}
