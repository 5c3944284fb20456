//! # 配置管理模块
//!
//! 处理应用配置加载和验证

mod app_config;
mod database;
mod provider_config;

pub use app_config::{AppConfig, AuthConfig, MAX_TOKEN_TTL, ServerConfig};
pub use database::DatabaseConfig;
pub use provider_config::{OAUTH2_STRATEGY, ProviderConfig};

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{BrokerError, Context, Result};
use crate::{
    ensure_config, linfo,
    logging::{LogComponent, LogStage},
};

/// 默认配置文件路径：`config/config.{RUST_ENV}.toml`
#[must_use]
pub fn default_config_path() -> PathBuf {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    PathBuf::from(format!("config/config.{env}.toml"))
}

/// 加载配置文件
///
/// 未指定路径时按 `RUST_ENV` 选择默认配置文件
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_file = path.map_or_else(default_config_path, Path::to_path_buf);

    if !config_file.exists() {
        return Err(BrokerError::config(format!(
            "配置文件不存在: {}",
            config_file.display()
        )));
    }

    let config_content = std::fs::read_to_string(&config_file).map_err(|e| {
        BrokerError::config_with_source(
            format!("读取配置文件失败: {}", config_file.display()),
            e,
        )
    })?;

    let config = parse_config(&config_content)
        .with_context(|| format!("加载配置文件 {}", config_file.display()))?;

    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "load_config",
        &format!(
            "Loaded {} with {} provider(s)",
            config_file.display(),
            config.providers.len()
        )
    );

    Ok(config)
}

/// 从 TOML 文本解析并验证配置
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;

    // 验证配置的有效性
    validate_config(&config)?;

    Ok(config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<()> {
    ensure_config!(config.server.port != 0, "无效的服务器端口: 0");

    ensure_config!(!config.database.url.is_empty(), "数据库URL不能为空");
    ensure_config!(
        config.database.max_connections > 0,
        "数据库最大连接数必须大于0"
    );

    ensure_config!(
        config.auth.ttl > 0,
        "访问令牌有效期必须大于0: {}",
        config.auth.ttl
    );
    ensure_config!(
        config.auth.ttl <= MAX_TOKEN_TTL,
        "访问令牌有效期不能超过 {} 秒: {}",
        MAX_TOKEN_TTL,
        config.auth.ttl
    );
    ensure_config!(
        config.auth.strategy_timeout_secs != Some(0),
        "strategy_timeout_secs 必须大于0"
    );

    for (name, provider) in &config.providers {
        if !provider.is_oauth2() {
            continue;
        }
        ensure_config!(
            provider.token_url.as_deref().is_some_and(|url| !url.is_empty()),
            "提供商 {} 缺少 token_url 配置",
            name
        );
        ensure_config!(
            provider
                .user_info_url
                .as_deref()
                .is_some_and(|url| !url.is_empty()),
            "提供商 {} 缺少 user_info_url 配置",
            name
        );
    }

    Ok(())
}
