//! Admin API 路由配置
//!
//! `/admin/v1` 下按资源拆分。

use actix_web::web;

use super::articles::{create_article, delete_article, update_article, upload_article_image};
use super::dashboard::{dashboard, recompute_ranking};
use super::feedback::{list_feedback, mark_answered};
use super::polls::{create_poll, delete_poll, list_polls, update_poll};
use super::taxonomy::{
    create_author, create_category, create_tag, delete_author, delete_category, delete_tag,
    list_authors, list_categories, list_tags, update_author, update_category,
    upload_author_photo,
};

/// 文章管理路由 `/articles`
pub fn articles_routes() -> actix_web::Scope {
    web::scope("/articles")
        .route("", web::post().to(create_article))
        .route("/{id}", web::put().to(update_article))
        .route("/{id}", web::delete().to(delete_article))
        .route("/{id}/image", web::post().to(upload_article_image))
}

/// 分类、作者、标签
pub fn taxonomy_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::delete().to(delete_category)),
    )
    .service(
        web::scope("/authors")
            .route("", web::get().to(list_authors))
            .route("", web::post().to(create_author))
            .route("/{id}", web::put().to(update_author))
            .route("/{id}", web::delete().to(delete_author))
            .route("/{id}/photo", web::post().to(upload_author_photo)),
    )
    .service(
        web::scope("/tags")
            .route("", web::get().to(list_tags))
            .route("", web::post().to(create_tag))
            .route("/{id}", web::delete().to(delete_tag)),
    );
}

/// 投票路由 `/polls`
pub fn polls_routes() -> actix_web::Scope {
    web::scope("/polls")
        .route("", web::get().to(list_polls))
        .route("", web::post().to(create_poll))
        .route("/{id}", web::put().to(update_poll))
        .route("/{id}", web::delete().to(delete_poll))
}

/// Admin API v1 路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .route("/dashboard", web::get().to(dashboard))
        .route("/ranking/recompute", web::post().to(recompute_ranking))
        .route("/feedback", web::get().to(list_feedback))
        .route("/feedback/{id}/answered", web::put().to(mark_answered))
        .service(articles_routes())
        .service(polls_routes())
        .configure(taxonomy_routes)
}
