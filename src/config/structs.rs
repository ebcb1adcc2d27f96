use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量、代理信任
/// - database: 数据库连接与重试
/// - logging: 日志
/// - site: 门户展示相关（时区偏移、分页、热门数量）
/// - auth: 会话 JWT 与 Cookie
/// - media: 图片存储与规格
/// - ingest: NewsAPI 导入与正文抓取
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：JCPE，分隔符：__
    /// 示例：JCPE__SERVER__PORT=9999
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 JCPE，分隔符 __
            .add_source(
                Environment::with_prefix("JCPE")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut loaded = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        };

        // NewsAPI 的惯用环境变量
        if loaded.ingest.news_api_key.is_none()
            && let Ok(key) = std::env::var("NEWS_API_KEY")
            && !key.is_empty()
        {
            loaded.ingest.news_api_key = Some(key);
        }

        loaded
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 可信反向代理（IP 或 CIDR），为空时对私有地址自动信任 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    /// 允许 `fake_ip` 查询参数覆盖客户端 IP（仅测试环境）
    #[serde(default)]
    pub allow_fake_ip: bool,
    /// 允许跨域访问 API 的前端来源；为空时只允许同源
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 门户展示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 计算“自然日”时相对 UTC 的偏移（分钟），默认 Recife（UTC-3）
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_most_read_limit")]
    pub most_read_limit: u64,
    #[serde(default = "default_most_read_cache_secs")]
    pub most_read_cache_secs: u64,
}

/// 会话认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 为空时启动期生成随机密钥（重启后会话失效）
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

/// 图片存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_root")]
    pub root: String,
    #[serde(default = "default_aspect_width")]
    pub aspect_width: u32,
    #[serde(default = "default_aspect_height")]
    pub aspect_height: u32,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// 新闻导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub news_api_key: Option<String>,
    #[serde(default = "default_news_api_base_url")]
    pub news_api_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 正文少于该长度的文章不入库
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// 抓取结果少于该长度视为失败
    #[serde(default = "default_min_scraped_chars")]
    pub min_scraped_chars: usize,
    /// 抓取结果截断长度
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://jcpe.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_utc_offset_minutes() -> i32 {
    -180
}

fn default_page_size() -> u64 {
    12
}

fn default_most_read_limit() -> u64 {
    5
}

fn default_most_read_cache_secs() -> u64 {
    60
}

fn default_access_token_minutes() -> u64 {
    60 * 24 * 14
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_aspect_width() -> u32 {
    16
}

fn default_aspect_height() -> u32 {
    9
}

fn default_max_width() -> u32 {
    1200
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_news_api_base_url() -> String {
    "https://newsapi.org".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_min_content_chars() -> usize {
    800
}

fn default_min_scraped_chars() -> usize {
    300
}

fn default_max_content_chars() -> usize {
    8000
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            trusted_proxies: Vec::new(),
            allow_fake_ip: false,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            page_size: default_page_size(),
            most_read_limit: default_most_read_limit(),
            most_read_cache_secs: default_most_read_cache_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_token_minutes(),
            cookie_secure: false,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            aspect_width: default_aspect_width(),
            aspect_height: default_aspect_height(),
            max_width: default_max_width(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            news_api_base_url: default_news_api_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            min_content_chars: default_min_content_chars(),
            min_scraped_chars: default_min_scraped_chars(),
            max_content_chars: default_max_content_chars(),
        }
    }
}
