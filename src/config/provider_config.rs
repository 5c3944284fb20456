//! # 提供商配置

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 内置通用 OAuth2 策略名称
pub const OAUTH2_STRATEGY: &str = "oauth2";

fn default_strategy() -> String {
    OAUTH2_STRATEGY.to_string()
}

/// 单个提供商的配置
///
/// 未识别的键保留在 `extra` 中，交给策略自行解释
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 使用的策略名称
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: None,
            token_url: None,
            user_info_url: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ProviderConfig {
    /// 是否使用内置通用 OAuth2 策略
    #[must_use]
    pub fn is_oauth2(&self) -> bool {
        self.strategy == OAUTH2_STRATEGY
    }

    /// 读取额外的字符串配置
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}
