use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::services::admin::{VoteRequest, api_result};
use crate::services::PollService;
use crate::utils::client_ip;

/// GET /api/polls/{id}
pub async fn get_poll(
    path: web::Path<i64>,
    polls: web::Data<Arc<PollService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(polls.tally(path.into_inner()).await))
}

/// POST /api/polls/{id}/vote：每个 IP 每个投票只计一次
pub async fn vote(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<VoteRequest>,
    polls: web::Data<Arc<PollService>>,
) -> ActixResult<impl Responder> {
    let ip = client_ip(&req);
    Ok(api_result(
        polls.cast_vote(path.into_inner(), body.option_id, &ip).await,
    ))
}
