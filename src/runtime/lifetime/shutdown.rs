use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，然后确认数据库仍可用后退出
pub async fn listen_for_shutdown(storage: Arc<SeaOrmStorage>) {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), storage.ping()).await {
        Ok(Ok(())) => info!("Database connection healthy at shutdown"),
        Ok(Err(e)) => error!("Database unavailable at shutdown: {}", e),
        Err(_) => error!(
            "Shutdown check timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
