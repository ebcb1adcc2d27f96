//! Admin API 文章管理

use actix_multipart::Multipart;
use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::errors::PortalError;
use crate::services::{ArticleForm, EditorialService, MediaStore};

use super::helpers::{api_result, created_response, error_from_portal, read_multipart};
use super::types::MessageResponse;

/// POST /articles
pub async fn create_article(
    form: web::Json<ArticleForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    match editorial.create_article(form.into_inner()).await {
        Ok(article) => {
            info!("Admin API: article '{}' created", article.slug);
            Ok(created_response(article))
        }
        Err(e) => Ok(error_from_portal(&e)),
    }
}

/// PUT /articles/{id}
pub async fn update_article(
    path: web::Path<i64>,
    form: web::Json<ArticleForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        editorial
            .update_article(path.into_inner(), form.into_inner())
            .await,
    ))
}

/// DELETE /articles/{id}
pub async fn delete_article(
    path: web::Path<i64>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(editorial.delete_article(id).await.map(|_| {
        MessageResponse {
            message: format!("Notícia {} removida.", id),
        }
    })))
}

/// POST /articles/{id}/image（multipart 字段 `image`）
pub async fn upload_article_image(
    path: web::Path<i64>,
    mut payload: Multipart,
    editorial: web::Data<Arc<EditorialService>>,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<impl Responder> {
    let form = match read_multipart(&mut payload, "image", media.max_upload_bytes()).await {
        Ok(form) => form,
        Err(e) => return Ok(error_from_portal(&e)),
    };
    let Some(bytes) = form.file else {
        return Ok(error_from_portal(&PortalError::invalid_field(
            "image",
            "Envie uma imagem.",
        )));
    };

    Ok(api_result(
        editorial.upload_article_image(path.into_inner(), bytes).await,
    ))
}
