// apps/gf_cli/src/main.rs

//! GhostFlow 命令行界面
//!
//! 读取 JSON 算例，校验配置或求解带浸入边界的泊松问题。
//! 库内的 `log` 记录经 tracing-log 转发到同一个订阅器。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

/// GhostFlow 嵌入边界求解器命令行工具
#[derive(Parser)]
#[command(name = "gf_cli")]
#[command(author = "GhostFlow Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GhostFlow embedded-boundary ghost-cell solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 求解算例
    Run(commands::run::RunArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish()
        .try_init()?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
