use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from "config.toml" in the current directory,
/// then applies `JCPE__*` environment overrides.
///
/// # Examples
/// ```no_run
/// use jcpe_portal::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// 使用给定配置初始化（已初始化时直接替换）
///
/// 主要用于测试与 CLI 参数覆盖。
pub fn init_config_with(config: StaticConfig) {
    match CONFIG.get() {
        Some(current) => current.store(Arc::new(config)),
        None => {
            let swap = ArcSwap::from_pointee(config.clone());
            if CONFIG.set(swap).is_err() {
                // 并发初始化时另一方已写入，覆盖为调用方的配置
                if let Some(current) = CONFIG.get() {
                    current.store(Arc::new(config));
                }
            }
        }
    }
}
