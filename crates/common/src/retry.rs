//! 启动期重试
//!
//! 数据库在容器编排中往往比服务晚就绪，连接建立需要指数退避重试

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数（含第一次）
    pub max_attempts: u32,
    /// 初始延迟
    pub initial_delay: Duration,
    /// 最大延迟
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// 第 n 次失败后的等待时间（翻倍，封顶 max_delay）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// 连接类错误的特征片段
const TRANSIENT_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "too many connections",
    "the database system is starting up",
    "no route to host",
    "broken pipe",
];

/// 判断错误是否是暂时性的（值得重试）
pub fn is_transient_error(error: &str) -> bool {
    let error = error.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| error.contains(p))
}

/// 执行异步操作，失败且 `should_retry` 为真时按退避策略重试
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt = attempt + 1, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt + 1 < config.max_attempts && should_retry(&e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(operation = operation_name, attempt = attempt + 1, error = %e, "Operation failed");
                return Err(e);
            }
        }
    }
}
