//! 指标模块
//!
//! 统一指标名称与标签，业务代码通过这里的函数记录，避免名称散落各处。

use std::time::Duration;

pub const RULETA_REQUESTS_TOTAL: &str = "ruleta_requests_total";
pub const RULETA_REQUEST_DURATION_SECONDS: &str = "ruleta_request_duration_seconds";
pub const RULETA_SPINS_TOTAL: &str = "ruleta_spins_total";
pub const ADMIN_REQUESTS_TOTAL: &str = "admin_requests_total";

/// `ruleta_spins_total` 的 outcome 标签
pub const SPIN_CONFIRMED: &str = "confirmed";
pub const SPIN_DEGRADED: &str = "degraded";
pub const SPIN_WITHHELD: &str = "withheld";
pub const SPIN_REJECTED: &str = "rejected";

/// 注册指标描述，供安装了 recorder 的进程在导出时附带 HELP 信息
pub fn describe_metrics() {
    metrics::describe_counter!(RULETA_REQUESTS_TOTAL, "Total number of ruleta API requests");
    metrics::describe_histogram!(
        RULETA_REQUEST_DURATION_SECONDS,
        "Ruleta API request duration in seconds"
    );
    metrics::describe_counter!(RULETA_SPINS_TOTAL, "Total number of wheel spins by outcome");
    metrics::describe_counter!(ADMIN_REQUESTS_TOTAL, "Total number of admin resource requests");
}

/// 记录一次转盘 API 调用（含所有重试）
#[inline]
pub fn record_ruleta_request(endpoint: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(RULETA_REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
    metrics::histogram!(RULETA_REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
        .record(elapsed.as_secs_f64());
}

/// 记录一次转盘结算或拒绝
///
/// outcome 取值见 `SPIN_*` 常量
#[inline]
pub fn record_spin(outcome: &'static str) {
    metrics::counter!(RULETA_SPINS_TOTAL, "outcome" => outcome).increment(1);
}

/// 记录一次后台资源请求
#[inline]
pub fn record_admin_request(resource: &'static str, operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        ADMIN_REQUESTS_TOTAL,
        "resource" => resource,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
