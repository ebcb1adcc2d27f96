use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analytics::ViewAnalytics;
use crate::api::jwt::get_jwt_service;
use crate::config::get_config;
use crate::services::{
    AccountService, ArticleService, EditorialService, FeedbackService, MediaStore,
    PersonalizationService, PollService, SavedArticleService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 服务器与批处理命令共用的组件
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub media: Arc<MediaStore>,
    pub analytics: Arc<ViewAnalytics>,
    pub articles: Arc<ArticleService>,
    pub accounts: Arc<AccountService>,
    pub editorial: Arc<EditorialService>,
    pub polls: Arc<PollService>,
    pub saved: Arc<SavedArticleService>,
    pub personalization: Arc<PersonalizationService>,
    pub feedback: Arc<FeedbackService>,
}

impl StartupContext {
    /// 在已有存储上组装全部 service
    pub fn with_storage(storage: Arc<SeaOrmStorage>) -> Self {
        let config = get_config();
        let media = Arc::new(MediaStore::new(&config.media));
        let analytics = Arc::new(ViewAnalytics::from_config(storage.clone()));

        Self {
            articles: Arc::new(ArticleService::new(storage.clone(), analytics.clone())),
            accounts: Arc::new(AccountService::new(storage.clone())),
            editorial: Arc::new(EditorialService::new(storage.clone(), media.clone())),
            polls: Arc::new(PollService::new(storage.clone())),
            saved: Arc::new(SavedArticleService::new(storage.clone())),
            personalization: Arc::new(PersonalizationService::new(storage.clone())),
            feedback: Arc::new(FeedbackService::new(storage.clone(), media.clone())),
            storage,
            media,
            analytics,
        }
    }
}

/// 连接数据库（含迁移）并组装 service
pub async fn prepare_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let context = StartupContext::with_storage(storage);

    tokio::fs::create_dir_all(context.media.root())
        .await
        .with_context(|| {
            format!(
                "Failed to create media directory {}",
                context.media.root().display()
            )
        })?;

    debug!(
        "Startup context ready in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}

/// 服务器额外的启动步骤
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let context = prepare_startup().await?;

    // 提前初始化 JWT，未配置密钥时在启动日志里给出提示
    let jwt = get_jwt_service();
    debug!(
        "JWT service ready, access tokens valid for {} minutes",
        jwt.access_token_minutes()
    );

    Ok(context)
}
