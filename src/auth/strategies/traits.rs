//! # 提供商策略特质
//!
//! 定义所有提供商策略必须实现的基础接口

use async_trait::async_trait;

use crate::auth::types::{AuthRequest, AuthType, ExternalIdentity, PreflightToken};
use crate::error::Result;

/// 提供商策略接口
///
/// 每次认证尝试由工厂根据提供商配置新建一个实例
#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    /// 策略使用的认证协议
    fn auth_type(&self) -> AuthType;

    /// 用请求中的凭据向提供商换取外部身份
    async fn authenticate(&self, request: &AuthRequest) -> Result<ExternalIdentity>;

    /// 获取 `OAuth1` 预授权令牌（仅 `OAuth1` 策略支持）
    async fn authorize(&self, _request: &AuthRequest) -> Result<PreflightToken> {
        Err(crate::config_error!(
            "{} strategies do not support authorize",
            self.auth_type()
        ))
    }
}
