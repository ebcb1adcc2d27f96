use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::media::{MediaKind, MediaStore};
use super::{finish_form, form_errors, non_blank};
use crate::errors::Result;
use crate::storage::{FeedbackEntry, NewFeedback, SeaOrmStorage};

/// Reader feedback form (multipart text fields)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeedbackForm {
    #[validate(length(min = 1, max = 100, message = "Informe seu nome (até 100 caracteres)."))]
    pub name: String,
    #[validate(email(message = "Informe um e-mail válido."))]
    pub email: String,
    #[validate(range(min = 1, max = 5, message = "Escolha uma avaliação de 1 a 5."))]
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

pub struct FeedbackService {
    storage: Arc<SeaOrmStorage>,
    media: Arc<MediaStore>,
}

impl FeedbackService {
    pub fn new(storage: Arc<SeaOrmStorage>, media: Arc<MediaStore>) -> Self {
        Self { storage, media }
    }

    /// Validate and store a submission; the optional image is normalized first
    pub async fn submit(&self, mut form: FeedbackForm, image: Option<Vec<u8>>) -> Result<FeedbackEntry> {
        form.name = form.name.trim().to_string();
        form.email = form.email.trim().to_lowercase();
        form.comment = non_blank(form.comment.as_deref());
        finish_form(form_errors(&form))?;

        let image = match image.filter(|b| !b.is_empty()) {
            Some(bytes) => Some(self.media.save(MediaKind::Feedback, bytes).await?),
            None => None,
        };

        let new = NewFeedback {
            name: form.name,
            email: form.email,
            rating: form.rating,
            comment: form.comment,
            image: image.clone(),
        };
        match self.storage.insert_feedback(&new).await {
            Ok(entry) => {
                info!("FeedbackService: feedback {} received (rating {})", entry.id, entry.rating);
                Ok(entry)
            }
            Err(e) => {
                if let Some(ref path) = image {
                    self.media.remove(path).await;
                }
                Err(e)
            }
        }
    }

    /// Newest first
    pub async fn list(&self, only_pending: bool) -> Result<Vec<FeedbackEntry>> {
        self.storage.list_feedback(only_pending).await
    }

    pub async fn mark_answered(&self, id: i64, answered: bool) -> Result<()> {
        self.storage.set_feedback_answered(id, answered).await
    }
}
