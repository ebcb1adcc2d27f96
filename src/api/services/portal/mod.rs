//! 读者端 JSON API（`/api`）

pub mod accounts;
pub mod articles;
pub mod feedback;
pub mod polls;
pub mod reader;

use actix_web::web;

use accounts::{login, login_rate_limiter, logout, me, register};
use articles::{article_detail, get_ranking, list_articles, list_categories, list_tags, most_read};
use feedback::submit_feedback;
use polls::{get_poll, vote};
use reader::{get_preferences, list_saved, put_preferences, save_article, unsave_article};

/// 认证路由 `/auth`
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/logout", web::post().to(logout))
        .route("/me", web::get().to(me))
}

/// 文章路由 `/articles`
pub fn articles_routes() -> actix_web::Scope {
    web::scope("/articles")
        .route("", web::get().to(list_articles))
        // most-read must be before /{slug}
        .route("/most-read", web::get().to(most_read))
        .route("/{id}/save", web::post().to(save_article))
        .route("/{id}/save", web::delete().to(unsave_article))
        .route("/{slug}", web::get().to(article_detail))
}

/// 读者端 API 路由
pub fn portal_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(articles_routes())
        .service(auth_routes())
        .route("/saved", web::get().to(list_saved))
        .route("/categories", web::get().to(list_categories))
        .route("/tags", web::get().to(list_tags))
        .route("/preferences", web::get().to(get_preferences))
        .route("/preferences", web::put().to(put_preferences))
        .route("/polls/{id}", web::get().to(get_poll))
        .route("/polls/{id}/vote", web::post().to(vote))
        .route("/feedback", web::post().to(submit_feedback))
        .route("/ranking", web::get().to(get_ranking))
}
