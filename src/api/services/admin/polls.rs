//! Admin API 投票管理

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::services::{PollForm, PollService};

use super::helpers::{api_result, created_response, error_from_portal};
use super::types::MessageResponse;

pub async fn list_polls(polls: web::Data<Arc<PollService>>) -> ActixResult<impl Responder> {
    Ok(api_result(polls.list().await))
}

pub async fn create_poll(
    form: web::Json<PollForm>,
    polls: web::Data<Arc<PollService>>,
) -> ActixResult<impl Responder> {
    Ok(match polls.create(form.into_inner()).await {
        Ok(tally) => created_response(tally),
        Err(e) => error_from_portal(&e),
    })
}

/// PUT /polls/{id}：未改动文本的选项保留票数
pub async fn update_poll(
    path: web::Path<i64>,
    form: web::Json<PollForm>,
    polls: web::Data<Arc<PollService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        polls.update(path.into_inner(), form.into_inner()).await,
    ))
}

pub async fn delete_poll(
    path: web::Path<i64>,
    polls: web::Data<Arc<PollService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(polls.delete(id).await.map(|_| MessageResponse {
        message: format!("Enquete {} removida.", id),
    })))
}
