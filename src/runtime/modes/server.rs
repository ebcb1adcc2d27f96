//! Server mode
//!
//! 组装 actix-web 应用：读者 API、编辑后台、健康检查与图片访问。

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::{AdminAuth, RequestIdMiddleware};
use crate::api::services::{
    AppStartTime, admin::routes::admin_v1_routes, health_routes, media_routes, portal_routes,
};
use crate::config::ServerConfig;
use crate::runtime::lifetime;

/// 请求体上限（JSON 表单）；multipart 上传单独按 media.max_upload_bytes 限制
const JSON_PAYLOAD_LIMIT: usize = 1024 * 1024;

/// Build CORS middleware from configuration
fn build_cors_middleware(config: &ServerConfig) -> Cors {
    // 未配置来源时保持浏览器同源策略
    if config.cors_allowed_origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600);

    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        // 任意来源时不允许携带凭据
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }

    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {}", e))?;

    let config = crate::config::get_config();
    let server_config = config.server.clone();

    let cpu_count = server_config.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    if server_config.trusted_proxies.is_empty() {
        warn!(
            "Client IP: auto-detect mode enabled. \
             Connections from private IPs will use X-Forwarded-For. \
             To disable, configure server.trusted_proxies explicitly."
        );
    } else {
        warn!(
            "Client IP: explicit trusted proxies configured: {:?}",
            server_config.trusted_proxies
        );
    }
    if server_config.allow_fake_ip {
        warn!("server.allow_fake_ip is enabled; the fake_ip query parameter overrides client IPs");
    }

    let storage = startup.storage.clone();
    let storage_for_shutdown = startup.storage.clone();
    let media = startup.media.clone();
    let analytics = startup.analytics.clone();
    let articles = startup.articles.clone();
    let accounts = startup.accounts.clone();
    let editorial = startup.editorial.clone();
    let polls = startup.polls.clone();
    let saved = startup.saved.clone();
    let personalization = startup.personalization.clone();
    let feedback = startup.feedback.clone();
    let cors_config = server_config.clone();

    let server = HttpServer::new(move || {
        let cors = build_cors_middleware(&cors_config);

        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .wrap(Compress::default())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(media.clone()))
            .app_data(web::Data::new(analytics.clone()))
            .app_data(web::Data::new(articles.clone()))
            .app_data(web::Data::new(accounts.clone()))
            .app_data(web::Data::new(editorial.clone()))
            .app_data(web::Data::new(polls.clone()))
            .app_data(web::Data::new(saved.clone()))
            .app_data(web::Data::new(personalization.clone()))
            .app_data(web::Data::new(feedback.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(JSON_PAYLOAD_LIMIT))
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .service(
                web::scope("/admin")
                    .wrap(AdminAuth)
                    .service(admin_v1_routes()),
            )
            .service(health_routes())
            .service(media_routes())
            .service(portal_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", server_config.host, server_config.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(storage_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
