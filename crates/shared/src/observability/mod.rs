//! 统一可观测性模块
//!
//! 提供日志初始化与指标记录的统一入口。
//! 库代码只通过 `metrics` facade 记录指标，是否安装 recorder 由进程入口决定。

pub mod metrics;
pub mod tracing;

pub use crate::config::ObservabilityConfig;
pub use self::tracing::init_tracing;
