use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::services::FeedbackService;

use super::helpers::api_result;
use super::types::{AnsweredRequest, FeedbackListQuery, MessageResponse};

/// GET /feedback?pending=true
pub async fn list_feedback(
    query: web::Query<FeedbackListQuery>,
    feedback: web::Data<Arc<FeedbackService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        feedback.list(query.pending.unwrap_or(false)).await,
    ))
}

/// PUT /feedback/{id}/answered
pub async fn mark_answered(
    path: web::Path<i64>,
    body: web::Json<AnsweredRequest>,
    feedback: web::Data<Arc<FeedbackService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        feedback
            .mark_answered(id, body.answered)
            .await
            .map(|_| MessageResponse {
                message: format!("Feedback {} atualizado.", id),
            }),
    ))
}
