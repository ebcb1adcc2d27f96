//! Admin API 分类、作者、标签

use actix_multipart::Multipart;
use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::errors::PortalError;
use crate::services::{AuthorForm, CategoryForm, EditorialService, MediaStore, TagForm};

use super::helpers::{api_result, created_response, error_from_portal, read_multipart};
use super::types::MessageResponse;

fn removed(what: &str, id: i64) -> MessageResponse {
    MessageResponse {
        message: format!("{} {} removido(a).", what, id),
    }
}

// ============ 分类 ============

pub async fn list_categories(
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(editorial.list_categories().await))
}

pub async fn create_category(
    form: web::Json<CategoryForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(match editorial.create_category(form.into_inner()).await {
        Ok(category) => created_response(category),
        Err(e) => error_from_portal(&e),
    })
}

pub async fn update_category(
    path: web::Path<i64>,
    form: web::Json<CategoryForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        editorial
            .update_category(path.into_inner(), form.into_inner())
            .await,
    ))
}

pub async fn delete_category(
    path: web::Path<i64>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        editorial
            .delete_category(id)
            .await
            .map(|_| removed("Categoria", id)),
    ))
}

// ============ 作者 ============

pub async fn list_authors(
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(editorial.list_authors().await))
}

pub async fn create_author(
    form: web::Json<AuthorForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(match editorial.create_author(form.into_inner()).await {
        Ok(author) => created_response(author),
        Err(e) => error_from_portal(&e),
    })
}

pub async fn update_author(
    path: web::Path<i64>,
    form: web::Json<AuthorForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        editorial
            .update_author(path.into_inner(), form.into_inner())
            .await,
    ))
}

pub async fn delete_author(
    path: web::Path<i64>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        editorial.delete_author(id).await.map(|_| removed("Autor", id)),
    ))
}

/// POST /authors/{id}/photo（multipart 字段 `photo`）
pub async fn upload_author_photo(
    path: web::Path<i64>,
    mut payload: Multipart,
    editorial: web::Data<Arc<EditorialService>>,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<impl Responder> {
    let form = match read_multipart(&mut payload, "photo", media.max_upload_bytes()).await {
        Ok(form) => form,
        Err(e) => return Ok(error_from_portal(&e)),
    };
    let Some(bytes) = form.file else {
        return Ok(error_from_portal(&PortalError::invalid_field(
            "photo",
            "Envie uma foto.",
        )));
    };

    Ok(api_result(
        editorial.upload_author_photo(path.into_inner(), bytes).await,
    ))
}

// ============ 标签 ============

pub async fn list_tags(editorial: web::Data<Arc<EditorialService>>) -> ActixResult<impl Responder> {
    Ok(api_result(editorial.list_tags().await))
}

pub async fn create_tag(
    form: web::Json<TagForm>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    Ok(match editorial.create_tag(form.into_inner()).await {
        Ok(tag) => created_response(tag),
        Err(e) => error_from_portal(&e),
    })
}

pub async fn delete_tag(
    path: web::Path<i64>,
    editorial: web::Data<Arc<EditorialService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        editorial.delete_tag(id).await.map(|_| removed("Tag", id)),
    ))
}
