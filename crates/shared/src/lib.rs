//! 共享库
//!
//! 折扣转盘与后台管理客户端共用的错误类型、重试执行器、配置加载与可观测性初始化。

pub mod config;
pub mod error;
pub mod observability;
pub mod retry;
