//! # 认证类型定义
//!
//! 定义社交登录流程中传递的数据结构

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BrokerError, Result};
use crate::store::AccessToken;

/// 提供商认证协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// `OAuth 1.0a`，需要先获取预授权令牌
    OAuth1,
    /// `OAuth 2.0`
    OAuth2,
}

impl AuthType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OAuth1 => "oauth1",
            Self::OAuth2 => "oauth2",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 入站认证请求参数
///
/// 请求体中的 JSON 对象，原样交给策略解释
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthRequest(Map<String, Value>);

impl AuthRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 从任意 JSON 值构建，`null` 视为空请求
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(BrokerError::invalid_request(format!(
                "auth request must be a JSON object, got {other}"
            ))),
        }
    }

    /// 设置参数
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 读取非空字符串参数
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// 是否携带 `OAuth1` 回调参数（`oauth_token` 与 `oauth_verifier` 都存在且非空）
    #[must_use]
    pub fn has_oauth1_completion(&self) -> bool {
        self.get_str("oauth_token").is_some() && self.get_str("oauth_verifier").is_some()
    }
}

/// 提供商返回的外部身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// 提供商侧的用户ID
    pub provider_user_id: String,
    /// 邮箱，可能为空
    #[serde(default)]
    pub user_email: String,
    /// 显示名称，可能为空
    #[serde(default)]
    pub display_name: String,
}

impl ExternalIdentity {
    pub fn new(
        provider_user_id: impl Into<String>,
        user_email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            provider_user_id: provider_user_id.into(),
            user_email: user_email.into(),
            display_name: display_name.into(),
        }
    }
}

/// `OAuth1` 预授权令牌，原样返回给调用方
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreflightToken(pub Value);

/// 认证结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthOutcome {
    /// 登录成功，签发的本地访问令牌
    Token(AccessToken),
    /// `OAuth1` 第一步，返回预授权令牌
    Preflight(PreflightToken),
    /// 绑定结果
    Linked(bool),
}

/// 单次请求选择的流程
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// `OAuth1` 预授权
    Authorize,
    /// 把外部身份绑定到已知用户
    Link(i32),
    /// 认证并登录
    Authenticate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_oauth1_completion_requires_both_params() {
        let request = AuthRequest::new().with("oauth_token", "t");
        assert!(!request.has_oauth1_completion());

        let request = request.with("oauth_verifier", "");
        assert!(!request.has_oauth1_completion());

        let request = request.with("oauth_verifier", "v");
        assert!(request.has_oauth1_completion());
    }

    #[test]
    fn test_from_value() {
        let request = AuthRequest::from_value(json!({"code": "abc"})).unwrap();
        assert_eq!(request.get_str("code"), Some("abc"));

        assert_eq!(AuthRequest::from_value(Value::Null).unwrap(), AuthRequest::new());
        assert!(AuthRequest::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_outcome_serializes_untagged() {
        assert_eq!(serde_json::to_value(AuthOutcome::Linked(true)).unwrap(), json!(true));

        let preflight = PreflightToken(json!({"oauth_token": "req"}));
        assert_eq!(
            serde_json::to_value(AuthOutcome::Preflight(preflight)).unwrap(),
            json!({"oauth_token": "req"})
        );

        let token = AccessToken::issue(3, 60).aliased();
        let json = serde_json::to_value(AuthOutcome::Token(token.clone())).unwrap();
        assert_eq!(json["id"], json!(token.id));
        assert_eq!(json["token"], json!(token.id));
        assert_eq!(json["userId"], json!(3));
    }

    #[test]
    fn test_auth_type_display() {
        assert_eq!(AuthType::OAuth1.to_string(), "oauth1");
        assert_eq!(AuthType::OAuth2.to_string(), "oauth2");
    }
}
