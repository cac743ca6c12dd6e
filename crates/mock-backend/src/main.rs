//! Mock Backend CLI
//!
//! 模拟服务的命令行入口点。

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use mock_backend::MockBackendState;
use mock_backend::cli::Cli;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let state = Arc::new(MockBackendState::new(cli.mock_config()));
    for (token, user_id) in &cli.users {
        state.register_user(token, user_id);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, users = cli.users.len(), max_active = cli.max_active, "启动 Mock 服务");

    let server = mock_backend::serve(listener, state)?;
    tokio::signal::ctrl_c().await?;
    info!(addr = %server.addr(), "收到退出信号，停止 Mock 服务");

    Ok(())
}
