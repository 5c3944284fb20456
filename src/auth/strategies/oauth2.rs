//! # 通用 OAuth2 策略
//!
//! 由配置驱动的授权码换取流程：
//! 1. 用请求中的 `code` 向 `token_url` 换取 `access_token`
//! 2. 携带 Bearer 令牌请求 `user_info_url`
//! 3. 按配置的字段名提取用户ID、邮箱和显示名称

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use url::Url;

use crate::auth::strategies::traits::ProviderStrategy;
use crate::auth::types::{AuthRequest, AuthType, ExternalIdentity};
use crate::config::ProviderConfig;
use crate::error::{BrokerError, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

const USER_AGENT: &str = concat!("social-auth/", env!("CARGO_PKG_VERSION"));

/// 通用 OAuth2 授权码策略
#[derive(Debug, Clone)]
pub struct GenericOAuth2Strategy {
    provider: String,
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: Option<String>,
    token_url: Url,
    user_info_url: Url,
    id_field: String,
    email_field: String,
    name_field: String,
}

impl GenericOAuth2Strategy {
    /// 从提供商配置创建策略
    pub fn from_config(provider: &str, config: &ProviderConfig, http_client: Client) -> Result<Self> {
        let token_url = parse_endpoint(provider, "token_url", config.token_url.as_deref())?;
        let user_info_url =
            parse_endpoint(provider, "user_info_url", config.user_info_url.as_deref())?;

        Ok(Self {
            provider: provider.to_string(),
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url,
            user_info_url,
            id_field: config.extra_str("id_field").unwrap_or("id").to_string(),
            email_field: config.extra_str("email_field").unwrap_or("email").to_string(),
            name_field: config.extra_str("name_field").unwrap_or("name").to_string(),
        })
    }

    /// 使用授权码获取访问令牌
    async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<String> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(redirect_uri) = redirect_uri {
            params.push(("redirect_uri", redirect_uri));
        }

        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .form(&params)
            .send()
            .await
            .map_err(|e| BrokerError::upstream_with_source(&self.provider, "令牌请求失败", e))?;

        let body = self.read_json(response, "令牌交换失败").await?;

        body.get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                let reason = body
                    .get("error_description")
                    .or_else(|| body.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("响应中缺少access_token");
                BrokerError::upstream(&self.provider, reason)
            })
    }

    /// 获取用户信息
    async fn fetch_user_info(&self, access_token: &str) -> Result<Value> {
        let response = self
            .http_client
            .get(self.user_info_url.clone())
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| BrokerError::upstream_with_source(&self.provider, "用户信息请求失败", e))?;

        self.read_json(response, "获取用户信息失败").await
    }

    async fn read_json(&self, response: reqwest::Response, what: &str) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrokerError::upstream_with_source(&self.provider, "响应读取失败", e))?;

        if !status.is_success() {
            return Err(crate::upstream_error!(
                &self.provider,
                "{} ({}): {}",
                what,
                status,
                body
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            BrokerError::upstream_with_source(&self.provider, format!("{what}: 响应不是有效的JSON"), e)
        })
    }

    /// 从用户信息中提取外部身份
    fn extract_identity(&self, user_info: &Value) -> Result<ExternalIdentity> {
        let provider_user_id = match lookup(user_info, &self.id_field) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(crate::upstream_error!(
                    &self.provider,
                    "用户信息中缺少字段 {}",
                    self.id_field
                ));
            }
        };

        let text = |field: &str| {
            lookup(user_info, field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(ExternalIdentity {
            provider_user_id,
            user_email: text(&self.email_field),
            display_name: text(&self.name_field),
        })
    }
}

#[async_trait]
impl ProviderStrategy for GenericOAuth2Strategy {
    fn auth_type(&self) -> AuthType {
        AuthType::OAuth2
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<ExternalIdentity> {
        let code = request
            .get_str("code")
            .ok_or_else(|| BrokerError::upstream(&self.provider, "缺少授权码 code"))?;
        let redirect_uri = request
            .get_str("redirectUri")
            .or(self.redirect_uri.as_deref());

        let access_token = self.exchange_code(code, redirect_uri).await?;
        let user_info = self.fetch_user_info(&access_token).await?;
        let identity = self.extract_identity(&user_info)?;

        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::Strategy,
            "oauth2_identity",
            &format!(
                "{} returned identity {}",
                self.provider, identity.provider_user_id
            )
        );

        Ok(identity)
    }
}

/// 字段名以 `/` 开头时按 JSON Pointer 解析，否则取顶层字段
fn lookup<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    if field.starts_with('/') {
        value.pointer(field)
    } else {
        value.get(field)
    }
}

fn parse_endpoint(provider: &str, key: &str, value: Option<&str>) -> Result<Url> {
    let raw = value
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| crate::config_error!("提供商 {} 缺少 {} 配置", provider, key))?;

    Url::parse(raw).map_err(|e| {
        BrokerError::config_with_source(format!("提供商 {provider} 的 {key} 无效: {raw}"), e)
    })
}
