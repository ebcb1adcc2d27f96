use actix_multipart::Multipart;
use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::services::admin::{created_response, error_from_portal, read_multipart};
use crate::errors::PortalError;
use crate::services::{FeedbackForm, FeedbackService, MediaStore};

/// POST /api/feedback（multipart：name, email, rating, comment, image）
pub async fn submit_feedback(
    mut payload: Multipart,
    feedback: web::Data<Arc<FeedbackService>>,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<impl Responder> {
    let form = match read_multipart(&mut payload, "image", media.max_upload_bytes()).await {
        Ok(form) => form,
        Err(e) => return Ok(error_from_portal(&e)),
    };

    let rating = match form.text("rating").map(|r| r.trim().parse::<i16>()) {
        Some(Ok(rating)) => rating,
        _ => {
            return Ok(error_from_portal(&PortalError::invalid_field(
                "rating",
                "Escolha uma avaliação de 1 a 5.",
            )));
        }
    };

    let submission = FeedbackForm {
        name: form.text("name").unwrap_or_default().to_string(),
        email: form.text("email").unwrap_or_default().to_string(),
        rating,
        comment: form.text("comment").map(str::to_string),
    };

    match feedback.submit(submission, form.file).await {
        Ok(entry) => Ok(created_response(entry)),
        Err(e) => Ok(error_from_portal(&e)),
    }
}
