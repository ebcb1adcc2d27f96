//! 文章列表、详情、热门与日榜

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::analytics::ViewAnalytics;
use crate::api::constants;
use crate::api::middleware::SessionUser;
use crate::api::services::admin::{
    ArticleListQuery, DateQuery, LimitQuery, RankingResponse, api_result, error_from_portal,
    parse_date, success_response,
};
use crate::services::{ArticleService, PersonalizationService};
use crate::storage::ArticleFilter;
use crate::utils::client_ip;

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// GET /api/articles
pub async fn list_articles(
    req: HttpRequest,
    query: web::Query<ArticleListQuery>,
    session: Option<SessionUser>,
    articles: web::Data<Arc<ArticleService>>,
    personalization: web::Data<Arc<PersonalizationService>>,
) -> ActixResult<impl Responder> {
    trace!("Portal API: list articles {:?}", query);

    let mut filter = ArticleFilter {
        category: non_empty(&query.categoria),
        author: non_empty(&query.autor),
        tag: non_empty(&query.tag),
        search: non_empty(&query.q),
        preference: None,
    };

    if query.personalize.unwrap_or(true) {
        let token = req
            .cookie(constants::PREFS_COOKIE_NAME)
            .map(|c| c.value().to_string());
        match personalization
            .resolve(session.map(|s| s.id), token.as_deref())
            .await
        {
            Ok((_, ids)) => filter.preference = ids,
            Err(e) => return Ok(error_from_portal(&e)),
        }
    }

    Ok(api_result(
        articles.list(&filter, query.page, query.page_size).await,
    ))
}

/// GET /api/articles/most-read
pub async fn most_read(
    query: web::Query<LimitQuery>,
    articles: web::Data<Arc<ArticleService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(articles.most_read(query.limit).await))
}

/// GET /api/articles/{slug}：同时记录一次访问
pub async fn article_detail(
    req: HttpRequest,
    path: web::Path<String>,
    articles: web::Data<Arc<ArticleService>>,
) -> ActixResult<impl Responder> {
    let slug = path.into_inner();
    let ip = client_ip(&req);
    Ok(api_result(articles.detail(&slug, &ip).await))
}

/// GET /api/categories
pub async fn list_categories(
    articles: web::Data<Arc<ArticleService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(articles.categories().await))
}

/// GET /api/tags
pub async fn list_tags(articles: web::Data<Arc<ArticleService>>) -> ActixResult<impl Responder> {
    Ok(api_result(articles.tags().await))
}

/// GET /api/ranking?date=YYYY-MM-DD（默认昨天）
pub async fn get_ranking(
    query: web::Query<DateQuery>,
    analytics: web::Data<Arc<ViewAnalytics>>,
) -> ActixResult<impl Responder> {
    let day = match query.date.as_deref() {
        Some(value) => match parse_date(value) {
            Ok(day) => day,
            Err(e) => return Ok(error_from_portal(&e)),
        },
        None => analytics.yesterday(),
    };

    match analytics.ranking_for(day).await {
        Ok(entries) => Ok(success_response(RankingResponse { date: day, entries })),
        Err(e) => Ok(error_from_portal(&e)),
    }
}
