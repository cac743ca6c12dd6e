//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `spin` - 转动一次转盘并输出结算结果
//! - `codes` - 查看用户已领取的折扣码
//! - `admin list` - 分页浏览后台资源
//!
//! # 使用示例
//!
//! ```bash
//! # 转动转盘
//! RULETA_TOKEN=tok-1 ruleta spin
//!
//! # 查看折扣码
//! ruleta --token tok-1 codes
//!
//! # 浏览商品第 2 页
//! ruleta admin list products --page 2 --page-size 20
//! ```

pub mod commands;
pub mod runner;

pub use commands::{AdminCommands, AdminResource, Cli, Commands};
pub use runner::CommandRunner;
