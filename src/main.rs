//! # Social Auth 主程序
//!
//! 加载配置、连接数据库并启动社交登录 HTTP 服务

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use social_auth::{
    Result, bootstrap,
    config::{self, AppConfig},
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    server::{self, AppState},
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "social-auth", version, about = "Social login brokering service")]
struct Cli {
    /// 配置文件路径，默认 config/config.{RUST_ENV}.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别（`RUST_LOG` 优先）
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_logging(cli.log_level.as_deref());

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            lerror!(
                "system",
                LogStage::Configuration,
                LogComponent::Main,
                "config_failed",
                &format!("配置加载失败: {e}")
            );
            return Err(e);
        }
    };

    if let Err(e) = run(config).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    let users = bootstrap::build_user_store(&config).await?;
    let registry = bootstrap::build_registry(&config, Vec::new());
    let broker = bootstrap::build_broker(&config, registry, users);

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );

    server::serve(&config.server, AppState::new(Arc::new(broker))).await
}
