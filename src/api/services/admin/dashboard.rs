//! Admin API 概览与日榜重算

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::analytics::ViewAnalytics;
use crate::services::EditorialService;

use super::helpers::{api_result, error_from_portal, parse_date, success_response};
use super::types::{DateQuery, RankingResponse};

pub async fn dashboard(
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(editorial.dashboard().await))
}

/// POST /ranking/recompute?date=YYYY-MM-DD（默认昨天）
pub async fn recompute_ranking(
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

    info!("Admin API: ranking recompute requested for {}", day);
    match analytics.compute_daily_ranking(day).await {
        Ok(entries) => Ok(success_response(RankingResponse { date: day, entries })),
        Err(e) => Ok(error_from_portal(&e)),
    }
}
