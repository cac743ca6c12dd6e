//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand, ValueEnum};
use ruleta_shared::config::AppConfig;

/// 折扣转盘命令行工具
#[derive(Parser, Debug)]
#[command(name = "ruleta")]
#[command(version, about = "折扣转盘与电商后台命令行工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// 后台 API 地址，覆盖配置文件
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 用户 token
    #[arg(long, env = "RULETA_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 转动一次转盘
    ///
    /// 先检查可用折扣码是否已达上限，再播放动画并领取新码。
    Spin,

    /// 查看已领取的折扣码
    Codes,

    /// 后台资源管理
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// 分页列出资源
    List {
        /// 资源类型
        #[arg(value_enum)]
        resource: AdminResource,

        /// 页码（从 1 开始）
        #[arg(long, default_value = "1")]
        page: usize,

        /// 每页条数
        #[arg(long, default_value = "20")]
        page_size: usize,
    },
}

/// 后台资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdminResource {
    Categories,
    Products,
    Media,
    Reviews,
    Sales,
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_spin() {
        let cli = Cli::parse_from(["ruleta", "--token", "tok-1", "spin"]);
        assert!(matches!(cli.command, Commands::Spin));
        assert_eq!(cli.token.as_deref(), Some("tok-1"));
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ruleta",
            "codes",
            "--base-url",
            "http://127.0.0.1:9000",
            "-l",
            "debug",
        ]);
        assert!(matches!(cli.command, Commands::Codes));

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_cli_parse_admin_list() {
        let cli = Cli::parse_from([
            "ruleta",
            "admin",
            "list",
            "products",
            "--page",
            "2",
            "--page-size",
            "5",
        ]);
        match cli.command {
            Commands::Admin(AdminCommands::List {
                resource,
                page,
                page_size,
            }) => {
                assert_eq!(resource, AdminResource::Products);
                assert_eq!(page, 2);
                assert_eq!(page_size, 5);
            }
            _ => panic!("预期 admin list 命令"),
        }
    }

    #[test]
    fn test_cli_admin_list_defaults() {
        let cli = Cli::parse_from(["ruleta", "admin", "list", "sales"]);
        let Commands::Admin(AdminCommands::List {
            resource,
            page,
            page_size,
        }) = cli.command
        else {
            panic!("预期 admin list 命令");
        };
        assert_eq!(resource, AdminResource::Sales);
        assert_eq!(page, 1);
        assert_eq!(page_size, 20);
    }

    #[test]
    fn test_cli_rejects_unknown_resource() {
        assert!(Cli::try_parse_from(["ruleta", "admin", "list", "coupons"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
