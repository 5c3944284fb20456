//! # 认证编排器
//!
//! 按请求选择流程并驱动 [`ProviderSession`]：
//! - `OAuth1` 且没有回调参数：预授权，直接返回预授权令牌
//! - 已知调用方：认证后绑定到该用户，返回 `true`
//! - 其他情况：认证，查找或建档，签发访问令牌
//!
//! 失败时不回滚已经完成的步骤

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::auth::registry::ProviderRegistry;
use crate::auth::session::{ProviderSession, into_persistence};
use crate::auth::types::{AuthFlow, AuthOutcome, AuthRequest, AuthType};
use crate::config::ProviderConfig;
use crate::error::{BrokerError, Result};
use crate::store::UserStore;
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 社交登录编排器
pub struct AuthBroker {
    registry: Arc<ProviderRegistry>,
    users: Arc<dyn UserStore>,
    providers: HashMap<String, ProviderConfig>,
    strategy_timeout: Option<Duration>,
}

impl AuthBroker {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        users: Arc<dyn UserStore>,
        providers: impl IntoIterator<Item = (String, ProviderConfig)>,
    ) -> Self {
        Self {
            registry,
            users,
            providers: providers.into_iter().collect(),
            strategy_timeout: None,
        }
    }

    /// 设置策略调用超时
    #[must_use]
    pub const fn with_strategy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// 人类可读的提供商列表
    #[must_use]
    pub fn supported_providers(&self) -> String {
        self.registry.supported_providers()
    }

    /// 根据认证类型、回调参数和调用方选择流程
    #[must_use]
    pub fn select_flow(
        auth_type: AuthType,
        request: &AuthRequest,
        known_caller: Option<i32>,
    ) -> AuthFlow {
        if auth_type == AuthType::OAuth1 && !request.has_oauth1_completion() {
            return AuthFlow::Authorize;
        }
        match known_caller {
            Some(user_id) => AuthFlow::Link(user_id),
            None => AuthFlow::Authenticate,
        }
    }

    /// 处理一次社交登录请求
    pub async fn auth(
        &self,
        provider: &str,
        request: &AuthRequest,
        known_caller: Option<i32>,
    ) -> Result<AuthOutcome> {
        let request_id = Uuid::new_v4().to_string();

        let result = self
            .run(&request_id, provider, request, known_caller)
            .await;

        if let Err(err) = &result {
            lwarn!(
                &request_id,
                LogStage::Request,
                LogComponent::Broker,
                "auth_failed",
                &format!("Authentication via {provider} failed: {err}")
            );
        }

        result
    }

    async fn run(
        &self,
        request_id: &str,
        provider: &str,
        request: &AuthRequest,
        known_caller: Option<i32>,
    ) -> Result<AuthOutcome> {
        let default_config = ProviderConfig::default();
        let config = self.providers.get(provider).unwrap_or(&default_config);

        let session = ProviderSession::new(provider, self.users.clone(), config, &self.registry)?
            .with_timeout(self.strategy_timeout)
            .with_request_id(request_id);

        let flow = Self::select_flow(session.auth_type(), request, known_caller);

        linfo!(
            request_id,
            LogStage::Request,
            LogComponent::Broker,
            "auth_start",
            &format!("Handling {provider} request"),
            provider = %provider,
            flow = ?flow
        );

        match flow {
            AuthFlow::Authorize => {
                let preflight = session.authorize(request).await?;
                Ok(AuthOutcome::Preflight(preflight))
            }
            AuthFlow::Link(user_id) => {
                let identity = session.authenticate(request).await?;
                session.link(user_id, &identity).await?;
                Ok(AuthOutcome::Linked(true))
            }
            AuthFlow::Authenticate => {
                let identity = session.authenticate(request).await?;
                let user = match session.find_existing_user(&identity).await? {
                    Some(user) => user,
                    None => session.create_profile(&identity).await?,
                };
                let token = session.create_access_token(&user).await?;
                Ok(AuthOutcome::Token(token))
            }
        }
    }

    /// 解除用户与提供商的绑定
    ///
    /// 不涉及提供商调用；绑定本不存在时同样返回 `true`
    pub async fn unlink(&self, provider: &str, local_user_id: i32) -> Result<bool> {
        let request_id = Uuid::new_v4().to_string();

        let result = self.run_unlink(&request_id, provider, local_user_id).await;

        if let Err(err) = &result {
            lwarn!(
                &request_id,
                LogStage::Unlink,
                LogComponent::Broker,
                "unlink_failed",
                &format!("Unlinking {provider} from user {local_user_id} failed: {err}")
            );
        }

        result
    }

    async fn run_unlink(
        &self,
        request_id: &str,
        provider: &str,
        local_user_id: i32,
    ) -> Result<bool> {
        let mut user = self
            .users
            .find_by_id(local_user_id)
            .await
            .map_err(into_persistence)?
            .ok_or_else(|| BrokerError::user_not_found(local_user_id))?;

        let removed = user.unbind_provider(provider);
        self.users.save(&user).await.map_err(into_persistence)?;

        linfo!(
            request_id,
            LogStage::Unlink,
            LogComponent::Broker,
            "unlinked",
            &format!(
                "Unlinked {provider} from user {local_user_id} (was bound: {})",
                removed.is_some()
            )
        );

        Ok(true)
    }
}
