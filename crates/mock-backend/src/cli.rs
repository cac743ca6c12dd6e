//! CLI 命令定义
//!
//! 使用 clap derive 宏定义 mock 服务的启动参数。

use clap::Parser;

use crate::state::MockConfig;

/// Mock 后台服务
///
/// 启动一个内存版的转盘接口与后台资源接口，便于本地联调。
#[derive(Parser, Debug)]
#[command(name = "mock-backend")]
#[command(version, about = "电商后台与折扣转盘模拟服务")]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// 服务端口
    #[arg(short, long, default_value = "8090")]
    pub port: u16,

    /// 每个用户可同时持有的可用折扣码上限
    #[arg(long, default_value = "10")]
    pub max_active: u32,

    /// 关闭 token 轮换
    #[arg(long)]
    pub no_rotate: bool,

    /// 预先注册的用户 token，格式 token:user_id，可重复
    #[arg(short, long = "user", visible_alias = "token", value_parser = parse_user)]
    pub users: Vec<(String, String)>,
}

impl Cli {
    pub fn mock_config(&self) -> MockConfig {
        MockConfig {
            max_active: self.max_active,
            rotate_tokens: !self.no_rotate,
            ..MockConfig::default()
        }
    }
}

fn parse_user(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((token, user)) if !token.is_empty() && !user.is_empty() => {
            Ok((token.to_string(), user.to_string()))
        }
        _ => Err(format!("无效的用户参数 `{raw}`，应为 token:user_id")),
    }
}

// ============================================================================
// 单元测试
// ============================================================================
