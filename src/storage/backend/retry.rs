//! 写路径的失败分类与退避重试
//!
//! 门户的写操作失败后只分三类：锁冲突或连接池耗尽这类瞬时错误，
//! 按配置退避重试；唯一索引拦下的重复写入，对访问记录和收藏来说就是
//! 幂等成功；其余错误立即返回。

use std::future::Future;
use std::time::Duration;

use rand::RngExt;
use sea_orm::error::RuntimeErr;
use sea_orm::{DbErr, SqlErr};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::errors::Result;

/// MySQL 死锁 / 锁等待超时，PostgreSQL 序列化失败 / 死锁，SQLite BUSY / LOCKED
const LOCK_CONFLICT_CODES: [&str; 6] = ["1213", "1205", "40001", "40P01", "5", "6"];

const LOCK_CONFLICT_MESSAGES: [&str; 4] = [
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 驱动没有给出结构化错误时，按消息识别唯一约束冲突
const UNIQUE_VIOLATION_MESSAGES: [&str; 3] = [
    "unique constraint failed",
    "duplicate key value",
    "duplicate entry",
];

/// 写失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// 稍后重试可能成功
    Transient,
    /// 唯一索引已有同一行
    Duplicate,
    Fatal,
}

/// 幂等插入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// 唯一索引命中，未写入
    Duplicate,
}

fn runtime_message(err: &RuntimeErr) -> String {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err.to_string(),
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

fn mentions_any(message: &str, needles: &[&str]) -> bool {
    let message = message.to_lowercase();
    needles.iter().any(|n| message.contains(n))
}

fn is_lock_conflict(err: &RuntimeErr) -> bool {
    if let RuntimeErr::SqlxError(sqlx_err) = err
        && let Some(code) = sqlx_err.as_database_error().and_then(|db| db.code())
    {
        let code = code.to_string();
        return LOCK_CONFLICT_CODES.contains(&code.as_str());
    }
    mentions_any(&runtime_message(err), &LOCK_CONFLICT_MESSAGES)
}

/// 判断一次写失败属于哪一类
pub fn classify(err: &DbErr) -> Failure {
    if matches!(err, DbErr::RecordNotInserted)
        || matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    {
        return Failure::Duplicate;
    }

    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => Failure::Transient,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => {
            if mentions_any(&runtime_message(runtime), &UNIQUE_VIOLATION_MESSAGES) {
                Failure::Duplicate
            } else if is_lock_conflict(runtime) {
                Failure::Transient
            } else {
                Failure::Fatal
            }
        }
        _ => Failure::Fatal,
    }
}

/// 写操作重试策略，来自 `[database]` 配置段
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次失败后最多再试几次
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            retries: config.retry_count,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// 第 `retry` 次重试前的等待：base * 2^(retry-1)，封顶 max，再加 0-25% 抖动
    pub fn backoff(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let exponent = retry.saturating_sub(1).min(20);
        let capped = Ord::min(base_ms.saturating_mul(1u64 << exponent), max_ms);
        let jitter = rand::rng().random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }

    /// 执行写操作，瞬时错误按退避重试
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> std::result::Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, DbErr>>,
    {
        let mut retry = 0;
        loop {
            let err = match operation().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!("Write '{}' succeeded after {} retries", label, retry);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if classify(&err) != Failure::Transient || retry >= self.retries {
                return Err(err);
            }

            retry += 1;
            let delay = self.backoff(retry);
            warn!(
                "Write '{}' hit a transient error (retry {}/{}): {}; waiting {:?}",
                label, retry, self.retries, err, delay
            );
            sleep(delay).await;
        }
    }

    /// 执行 `ON CONFLICT DO NOTHING` 插入，把各后端“未插入”的不同表达
    /// （受影响 0 行、`RecordNotInserted`、唯一约束错误）统一成 Duplicate
    pub async fn insert_once<F, Fut>(&self, label: &str, operation: F) -> Result<InsertOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<u64, DbErr>>,
    {
        match self.run(label, operation).await {
            Ok(0) => Ok(InsertOutcome::Duplicate),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if classify(&err) == Failure::Duplicate => Ok(InsertOutcome::Duplicate),
            Err(err) => Err(err.into()),
        }
    }
}
