//! 重试策略与执行器
//!
//! 为瞬时故障（网络抖动、请求超时）提供固定间隔或退避重试。
//! 业务错误（如服务端 4xx 拒绝）不应被重试，由调用方通过 `is_retryable` 闭包控制。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

// ---------------------------------------------------------------------------
// RetryPolicy: 重试策略配置
// ---------------------------------------------------------------------------

/// 重试策略配置
///
/// `multiplier` 为 1.0 时即固定间隔重试；大于 1.0 时为指数退避。
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次执行）
    pub max_attempts: u32,
    /// 两次尝试之间的基础等待时间
    pub delay: Duration,
    /// 每次重试的退避倍数
    pub multiplier: f64,
    /// 退避时间上限
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 默认策略：共尝试 3 次，每次间隔 1 秒
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            multiplier: 1.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// 固定间隔策略
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            ..Self::default()
        }
    }

    /// 不重试，只执行一次
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// 计算第 N 次失败后的等待时间（attempt 从 0 开始）
    ///
    /// 公式: delay * multiplier^attempt，结果不超过 max_delay。
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// 已执行 `attempts_made` 次后是否还能再试
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// retry_with_policy: 带重试的异步执行器
// ---------------------------------------------------------------------------

/// 带重试的异步执行器
///
/// 对任意异步操作应用重试策略。仅在操作返回可重试错误时才重试，
/// 不可重试的错误直接向上传播。重试耗尽后返回最后一次的错误。
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempts_made: u32 = 0;

    loop {
        attempts_made += 1;
        match operation().await {
            Ok(value) => {
                if attempts_made > 1 {
                    info!(operation = operation_name, attempt = attempts_made, "操作在重试后成功");
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    warn!(
                        operation = operation_name,
                        error = %err,
                        "操作失败且不可重试，直接返回错误"
                    );
                    return Err(err);
                }

                if !policy.should_retry(attempts_made) {
                    warn!(
                        operation = operation_name,
                        attempt = attempts_made,
                        max_attempts = policy.max_attempts,
                        error = %err,
                        "已达最大尝试次数，放弃重试"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempts_made - 1);
                warn!(
                    operation = operation_name,
                    attempt = attempts_made,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "操作失败，等待后重试"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
