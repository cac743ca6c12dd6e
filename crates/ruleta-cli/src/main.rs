//! Ruleta CLI
//!
//! 命令行入口点。

use anyhow::Context;
use clap::Parser;
use ruleta_cli::cli::{AdminCommands, Cli, CommandRunner, Commands};
use ruleta_shared::config::AppConfig;
use ruleta_shared::observability::{init_tracing, metrics::describe_metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("ruleta-cli").context("加载配置失败")?;
    cli.apply_overrides(&mut config);

    init_tracing(&config.observability)?;
    if config.observability.metrics_enabled {
        describe_metrics();
    }

    let runner = CommandRunner::new(config, cli.token.clone());

    let output = match cli.command {
        Commands::Spin => runner.run_spin().await?,
        Commands::Codes => runner.run_codes().await?,
        Commands::Admin(AdminCommands::List {
            resource,
            page,
            page_size,
        }) => runner.run_admin_list(resource, page, page_size).await?,
    };

    println!("{output}");
    Ok(())
}
