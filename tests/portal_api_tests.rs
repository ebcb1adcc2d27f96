//! HTTP API integration tests
//!
//! Builds the same route tree as server mode on top of a temporary SQLite
//! database and drives it through `actix_web::test`.

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;

use jcpe_portal::api::jwt::get_jwt_service;
use jcpe_portal::api::middleware::AdminAuth;
use jcpe_portal::api::services::admin::routes::admin_v1_routes;
use jcpe_portal::api::services::{AppStartTime, health_routes, portal_routes};
use jcpe_portal::config::init_config;
use jcpe_portal::runtime::lifetime::startup::StartupContext;
use jcpe_portal::services::PollForm;
use jcpe_portal::storage::{NewArticle, SeaOrmStorage};

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_context() -> (StartupContext, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("api.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (StartupContext::with_storage(Arc::new(storage)), temp_dir)
}

/// 与 server 模式相同的路由与 app_data
macro_rules! portal_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.storage.clone()))
                .app_data(web::Data::new($ctx.media.clone()))
                .app_data(web::Data::new($ctx.analytics.clone()))
                .app_data(web::Data::new($ctx.articles.clone()))
                .app_data(web::Data::new($ctx.accounts.clone()))
                .app_data(web::Data::new($ctx.editorial.clone()))
                .app_data(web::Data::new($ctx.polls.clone()))
                .app_data(web::Data::new($ctx.saved.clone()))
                .app_data(web::Data::new($ctx.personalization.clone()))
                .app_data(web::Data::new($ctx.feedback.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: Utc::now(),
                }))
                .service(
                    web::scope("/admin")
                        .wrap(AdminAuth)
                        .service(admin_v1_routes()),
                )
                .service(health_routes())
                .service(portal_routes()),
        )
        .await
    };
}

fn peer(ip: &str) -> SocketAddr {
    format!("{}:40000", ip).parse().unwrap()
}

fn bearer(user_id: i64, is_staff: bool) -> (&'static str, String) {
    let token = get_jwt_service()
        .generate_access_token(user_id, is_staff)
        .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

async fn create_article(storage: &SeaOrmStorage, slug: &str, category_id: Option<i64>) -> i64 {
    storage
        .insert_article(&NewArticle {
            title: format!("Notícia {}", slug),
            slug: slug.to_string(),
            summary: Some("Resumo".to_string()),
            body: "Conteúdo completo".to_string(),
            image: None,
            category_id,
            author_id: None,
            tag_ids: Vec::new(),
            published_at: Utc::now(),
        })
        .await
        .unwrap()
}

// =============================================================================
// 健康检查
// =============================================================================

#[actix_rt::test]
async fn test_health_check_reports_storage() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["storage"]["status"], "healthy");
    assert_eq!(body["data"]["storage"]["backend"], "sqlite");

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// 文章
// =============================================================================

#[actix_rt::test]
async fn test_list_articles_by_category() {
    let (ctx, _dir) = create_context().await;
    let esportes = ctx.storage.create_category("Esportes", "esportes").await.unwrap();
    create_article(&ctx.storage, "jogo-do-sport", Some(esportes.id)).await;
    create_article(&ctx.storage, "camara-aprova", None).await;
    let app = portal_app!(ctx);

    let req = TestRequest::get()
        .uri("/api/articles?categoria=esportes")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["slug"], "jogo-do-sport");
    assert_eq!(body["data"]["items"][0]["category"]["slug"], "esportes");

    let req = TestRequest::get().uri("/api/articles").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 2);
}

#[actix_rt::test]
async fn test_article_detail_records_one_view_per_ip() {
    let (ctx, _dir) = create_context().await;
    let article = create_article(&ctx.storage, "ponte-reaberta", None).await;
    let analytics = ctx.analytics.clone();
    let app = portal_app!(ctx);

    for ip in ["203.0.113.5", "203.0.113.5", "198.51.100.7"] {
        let req = TestRequest::get()
            .uri("/api/articles/ponte-reaberta")
            .peer_addr(peer(ip))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let views = analytics
        .count_unique_views(article, analytics.today())
        .await
        .unwrap();
    assert_eq!(views, 2);
}

#[actix_rt::test]
async fn test_article_detail_not_found() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::get().uri("/api/articles/nao-existe").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_ranking_rejects_bad_date() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::get().uri("/api/ranking?date=ontem").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// 投票
// =============================================================================

#[actix_rt::test]
async fn test_vote_once_per_ip() {
    let (ctx, _dir) = create_context().await;
    let tally = ctx
        .polls
        .create(PollForm {
            title: "Transporte".to_string(),
            question: "O metrô melhorou?".to_string(),
            article_id: None,
            options: vec!["Sim".to_string(), "Não".to_string()],
        })
        .await
        .unwrap();
    let option = tally.options[0].id;
    let app = portal_app!(ctx);

    let uri = format!("/api/polls/{}/vote", tally.poll_id);
    let req = TestRequest::post()
        .uri(&uri)
        .peer_addr(peer("203.0.113.10"))
        .set_json(json!({ "option_id": option }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total_votes"], 1);
    assert_eq!(body["data"]["options"][0]["percentage"], 100.0);

    let req = TestRequest::post()
        .uri(&uri)
        .peer_addr(peer("203.0.113.10"))
        .set_json(json!({ "option_id": option }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 4000);

    let req = TestRequest::post()
        .uri(&uri)
        .peer_addr(peer("203.0.113.11"))
        .set_json(json!({ "option_id": 999_999 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// 账户与读者功能
// =============================================================================

#[actix_rt::test]
async fn test_register_sets_session_cookie() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Carla",
            "email": "carla@example.com",
            "password": "segredo123",
            "password_confirm": "segredo123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.response().cookies().any(|c| c.name() == "jcpe_session"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["email"], "carla@example.com");
}

#[actix_rt::test]
async fn test_register_field_errors() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Carla",
            "email": "invalido",
            "password": "123",
            "password_confirm": "456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["email"].is_array());
    assert!(body["data"]["password_confirm"].is_array());
}

#[actix_rt::test]
async fn test_saved_requires_session() {
    let (ctx, _dir) = create_context().await;
    let reader = ctx
        .storage
        .insert_user("Leitor", "leitor@example.com", "x", false)
        .await
        .unwrap();
    let article = create_article(&ctx.storage, "salvar-esta", None).await;
    let app = portal_app!(ctx);

    let req = TestRequest::get().uri("/api/saved").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let uri = format!("/api/articles/{}/save", article);
    for _ in 0..2 {
        let req = TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(reader.id, false))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = TestRequest::get()
        .uri("/api/saved")
        .insert_header(bearer(reader.id, false))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_anonymous_preferences_use_cookie() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::put()
        .uri("/api/preferences")
        .set_json(json!({ "categories": ["esportes"], "tags": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "jcpe_prefs")
        .map(|c| c.into_owned())
        .expect("preference cookie");

    let req = TestRequest::get()
        .uri("/api/preferences")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["source"], "token");
    assert_eq!(body["data"]["categories"][0], "esportes");
}

// =============================================================================
// 管理后台
// =============================================================================

#[actix_rt::test]
async fn test_admin_requires_staff() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::get().uri("/admin/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/admin/v1/dashboard")
        .insert_header(bearer(1, false))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::get()
        .uri("/admin/v1/dashboard")
        .insert_header(bearer(1, true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_admin_creates_article() {
    let (ctx, _dir) = create_context().await;
    let app = portal_app!(ctx);

    let req = TestRequest::post()
        .uri("/admin/v1/articles")
        .insert_header(bearer(1, true))
        .set_json(json!({
            "title": "Nova ponte sobre o Capibaribe",
            "body": "Texto da notícia.",
            "tag_ids": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["slug"], "nova-ponte-sobre-o-capibaribe");
}
