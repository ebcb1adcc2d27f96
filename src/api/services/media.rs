//! 图片文件访问（`/media/...`）

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::debug;

use crate::api::services::admin::{ErrorCode, error_response};
use crate::services::MediaStore;

/// 只允许 media 根目录下的相对 `.jpg` 路径
pub fn is_safe_media_path(relative: &str) -> bool {
    relative.ends_with(".jpg")
        && !relative.contains('\\')
        && relative
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

pub async fn serve_media(
    path: web::Path<String>,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<HttpResponse> {
    let relative = path.into_inner();
    let not_found = || error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Imagem não encontrada");

    if !is_safe_media_path(&relative) {
        return Ok(not_found());
    }

    match tokio::fs::read(media.root().join(&relative)).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header(("Cache-Control", "public, max-age=86400"))
            .body(bytes)),
        Err(e) => {
            debug!("Media file {} unavailable: {}", relative, e);
            Ok(not_found())
        }
    }
}

pub fn media_routes() -> actix_web::Scope {
    web::scope("/media").route("/{path:.*}", web::get().to(serve_media))
}
