//! # 提供商会话
//!
//! 每次认证尝试创建一个会话：构造时立即解析并实例化策略（未知提供商在任何
//! I/O 之前失败），随后在策略调用之上叠加用户查找、建档、绑定和令牌签发。
//! 会话只在单个请求内使用，不跨请求共享

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::registry::ProviderRegistry;
use crate::auth::strategies::ProviderStrategy;
use crate::auth::types::{AuthRequest, AuthType, ExternalIdentity, PreflightToken};
use crate::config::ProviderConfig;
use crate::error::{BrokerError, Result};
use crate::store::{AccessToken, LocalUser, NewUser, UserFilter, UserStore, random_string};
use crate::{
    ldebug, linfo,
    logging::{LogComponent, LogStage},
};

/// 新建用户时生成的随机密码长度
pub const GENERATED_PASSWORD_LENGTH: usize = 18;

/// 单次认证尝试的提供商会话
pub struct ProviderSession {
    name: String,
    strategy: Box<dyn ProviderStrategy>,
    users: Arc<dyn UserStore>,
    timeout: Option<Duration>,
    request_id: String,
}

impl ProviderSession {
    /// 创建会话并实例化策略
    pub fn new(
        name: &str,
        users: Arc<dyn UserStore>,
        config: &ProviderConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self> {
        let factory = registry.resolve(name)?;
        let strategy = factory(config)?;

        Ok(Self {
            name: name.to_string(),
            strategy,
            users,
            timeout: None,
            request_id: "system".to_string(),
        })
    }

    /// 设置策略调用超时
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置日志使用的请求ID
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.strategy.auth_type()
    }

    /// 向提供商认证，换取外部身份
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<ExternalIdentity> {
        let identity = self
            .call_strategy(self.strategy.authenticate(request))
            .await?;

        linfo!(
            &self.request_id,
            LogStage::Authentication,
            LogComponent::Session,
            "authenticated",
            &format!("{} authenticated external user", self.name),
            provider = %self.name,
            external_id = %identity.provider_user_id
        );

        Ok(identity)
    }

    /// `OAuth1` 预授权
    pub async fn authorize(&self, request: &AuthRequest) -> Result<PreflightToken> {
        let token = self.call_strategy(self.strategy.authorize(request)).await?;

        linfo!(
            &self.request_id,
            LogStage::Authorization,
            LogComponent::Session,
            "authorized",
            &format!("{} issued a preflight token", self.name)
        );

        Ok(token)
    }

    /// 按 (提供商, 外部ID) 查找已绑定的用户
    pub async fn find_existing_user(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<Option<LocalUser>> {
        let filter = UserFilter::provider(&self.name, &identity.provider_user_id);
        self.users.find_one(&filter).await.map_err(into_persistence)
    }

    /// 为外部身份建档
    ///
    /// 邮箱已存在时把提供商绑定到该用户上，否则新建用户
    pub async fn create_profile(&self, identity: &ExternalIdentity) -> Result<LocalUser> {
        let existing = if identity.user_email.is_empty() {
            None
        } else {
            self.users
                .find_one(&UserFilter::Email(identity.user_email.clone()))
                .await
                .map_err(into_persistence)?
        };

        if let Some(mut user) = existing {
            user.bind_provider(&self.name, &identity.provider_user_id);
            user.fill_fullname(&identity.display_name);
            let user = self.users.save(&user).await.map_err(into_persistence)?;

            linfo!(
                &self.request_id,
                LogStage::Reconciliation,
                LogComponent::Session,
                "profile_merged",
                &format!("Bound {} to existing user {} by email", self.name, user.id)
            );
            return Ok(user);
        }

        let mut new_user = NewUser {
            email: identity.user_email.clone(),
            fullname: identity.display_name.clone(),
            password: random_string(GENERATED_PASSWORD_LENGTH),
            ..Default::default()
        };
        new_user
            .providers
            .insert(self.name.clone(), identity.provider_user_id.clone());

        let user = self.users.create(new_user).await.map_err(into_persistence)?;

        linfo!(
            &self.request_id,
            LogStage::Reconciliation,
            LogComponent::Session,
            "profile_created",
            &format!("Created user {} for {}", user.id, self.name)
        );

        Ok(user)
    }

    /// 把外部身份绑定到已有用户，从不新建用户
    pub async fn link(&self, local_user_id: i32, identity: &ExternalIdentity) -> Result<LocalUser> {
        let mut user = self
            .users
            .find_by_id(local_user_id)
            .await
            .map_err(into_persistence)?
            .ok_or_else(|| BrokerError::user_not_found(local_user_id))?;

        user.bind_provider(&self.name, &identity.provider_user_id);
        user.fill_fullname(&identity.display_name);
        let user = self.users.save(&user).await.map_err(into_persistence)?;

        linfo!(
            &self.request_id,
            LogStage::Linking,
            LogComponent::Session,
            "linked",
            &format!("Linked {} to user {}", self.name, user.id)
        );

        Ok(user)
    }

    /// 签发访问令牌，`token` 字段为 `id` 的别名
    pub async fn create_access_token(&self, user: &LocalUser) -> Result<AccessToken> {
        let token = self
            .users
            .create_access_token(user, self.users.token_ttl())
            .await
            .map_err(|e| BrokerError::token_issuance_with_source(e.to_string(), e))?;

        ldebug!(
            &self.request_id,
            LogStage::TokenIssue,
            LogComponent::Session,
            "token_issued",
            &format!("Issued access token for user {}", user.id)
        );

        Ok(token.aliased())
    }

    /// 调用策略，统一错误类型并应用超时
    async fn call_strategy<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                crate::upstream_error!(&self.name, "provider timed out after {:?}", timeout)
            })?,
            None => call.await,
        };

        result.map_err(|e| match e {
            BrokerError::UpstreamAuth { .. } => e,
            other => BrokerError::upstream_with_source(&self.name, other.to_string(), other),
        })
    }
}

pub(crate) fn into_persistence(err: BrokerError) -> BrokerError {
    match err {
        BrokerError::Persistence { .. } => err,
        other => BrokerError::persistence_with_source(other.to_string(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;
    use crate::testing::{MockUserStore, StaticStrategy, registry_with, sample_identity};
    use std::collections::BTreeMap;

    fn session(strategy: &StaticStrategy, users: Arc<dyn UserStore>) -> ProviderSession {
        let registry = registry_with(&[("github", strategy)]);
        ProviderSession::new("github", users, &ProviderConfig::default(), &registry).unwrap()
    }

    fn memory() -> Arc<MemoryUserStore> {
        Arc::new(MemoryUserStore::new(3600))
    }

    #[test]
    fn test_unknown_provider_fails_before_io() {
        let registry = ProviderRegistry::new();
        let err = ProviderSession::new("myspace", memory(), &ProviderConfig::default(), &registry)
            .err()
            .unwrap();
        assert!(matches!(err, BrokerError::UnknownProvider { .. }));
    }

    #[test]
    fn test_factory_can_reject_config() {
        let mut registry = ProviderRegistry::new();
        registry.register_fn("github", |_config| Err(crate::config_error!("bad config")));

        let err = ProviderSession::new("github", memory(), &ProviderConfig::default(), &registry)
            .err()
            .unwrap();
        assert!(matches!(err, BrokerError::Config { .. }));
    }

    #[tokio::test]
    async fn test_strategy_failure_surfaces_as_upstream() {
        let strategy = StaticStrategy::new(AuthType::OAuth2).rejecting();
        let session = session(&strategy, memory());

        let err = session.authenticate(&AuthRequest::new()).await.unwrap_err();
        assert!(
            matches!(err, BrokerError::UpstreamAuth { ref provider, .. } if provider == "github")
        );
    }

    #[tokio::test]
    async fn test_strategy_timeout() {
        let strategy =
            StaticStrategy::new(AuthType::OAuth2).with_delay(Duration::from_millis(200));
        let session = session(&strategy, memory()).with_timeout(Some(Duration::from_millis(10)));

        let err = session.authenticate(&AuthRequest::new()).await.unwrap_err();
        assert!(matches!(err, BrokerError::UpstreamAuth { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_create_profile_generates_distinct_passwords() {
        let store = memory();
        let session = session(&StaticStrategy::new(AuthType::OAuth2), store.clone());

        let first = session
            .create_profile(&ExternalIdentity::new("1", "one@x.com", "One"))
            .await
            .unwrap();
        let second = session
            .create_profile(&ExternalIdentity::new("2", "two@x.com", "Two"))
            .await
            .unwrap();

        assert_eq!(first.password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(first.password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.password, second.password);
        assert_eq!(first.fullname, "One");
        assert_eq!(first.provider_id("github"), Some("1"));
    }

    #[tokio::test]
    async fn test_create_profile_reuses_user_with_same_email() {
        let store = memory();
        let existing = store
            .create(NewUser {
                email: "a@x.com".to_string(),
                fullname: "Original".to_string(),
                password: "pw".to_string(),
                providers: BTreeMap::from([("twitter".to_string(), "t-9".to_string())]),
            })
            .await
            .unwrap();

        let session = session(&StaticStrategy::new(AuthType::OAuth2), store.clone());
        let user = session.create_profile(&sample_identity()).await.unwrap();

        assert_eq!(user.id, existing.id);
        assert_eq!(user.fullname, "Original");
        assert_eq!(user.provider_id("twitter"), Some("t-9"));
        assert_eq!(user.provider_id("github"), Some("ext-1"));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_email_always_creates() {
        let store = memory();
        let session = session(&StaticStrategy::new(AuthType::OAuth2), store.clone());

        session
            .create_profile(&ExternalIdentity::new("1", "", ""))
            .await
            .unwrap();
        session
            .create_profile(&ExternalIdentity::new("2", "", ""))
            .await
            .unwrap();

        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_link_missing_user_never_creates() {
        let store = memory();
        let session = session(&StaticStrategy::new(AuthType::OAuth2), store.clone());

        let err = session.link(404, &sample_identity()).await.unwrap_err();
        assert!(matches!(err, BrokerError::UserNotFound { user_id: 404 }));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_failures_map_to_persistence() {
        let mut store = MockUserStore::new();
        store
            .expect_find_one()
            .returning(|_| Err(BrokerError::internal("connection reset")));

        let session = session(&StaticStrategy::new(AuthType::OAuth2), Arc::new(store));
        let err = session.find_existing_user(&sample_identity()).await.unwrap_err();
        assert!(matches!(err, BrokerError::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_token_failure_maps_to_token_issuance() {
        let mut store = MockUserStore::new();
        store.expect_token_ttl().return_const(60_i64);
        store
            .expect_create_access_token()
            .returning(|_, _| Err(BrokerError::persistence("token table locked")));

        let session = session(&StaticStrategy::new(AuthType::OAuth2), Arc::new(store));
        let user = LocalUser {
            id: 1,
            email: String::new(),
            fullname: String::new(),
            password: String::new(),
            providers: BTreeMap::new(),
        };

        let err = session.create_access_token(&user).await.unwrap_err();
        assert!(matches!(err, BrokerError::TokenIssuance { .. }));
    }

    #[tokio::test]
    async fn test_access_token_aliases_id() {
        let store = memory();
        let session = session(&StaticStrategy::new(AuthType::OAuth2), store.clone());
        let user = session.create_profile(&sample_identity()).await.unwrap();

        let token = session.create_access_token(&user).await.unwrap();
        assert_eq!(token.token, token.id);
        assert_eq!(token.ttl, 3600);
        assert_eq!(token.user_id, user.id);
    }
}
