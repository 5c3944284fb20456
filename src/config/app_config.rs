//! # 应用配置结构定义

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DatabaseConfig, ProviderConfig};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 认证配置
    pub auth: AuthConfig,
    /// 提供商配置，以提供商名称为键
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// 监听地址
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 访问令牌有效期上限（秒），一年
pub const MAX_TOKEN_TTL: i64 = 31_556_926;

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 访问令牌有效期（秒），默认两周
    pub ttl: i64,
    /// 单次提供商调用超时（秒），不设置则不限时
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_timeout_secs: Option<u64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            ttl: 1_209_600,
            strategy_timeout_secs: None,
        }
    }
}
