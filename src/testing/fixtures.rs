//! # 测试 fixtures

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::auth::registry::{ProviderRegistry, StrategyFactory};
use crate::auth::strategies::ProviderStrategy;
use crate::auth::types::{AuthRequest, AuthType, ExternalIdentity, PreflightToken};
use crate::config::ProviderConfig;
use crate::error::{BrokerError, Result};

/// 返回固定结果的策略桩
#[derive(Debug, Clone)]
pub struct StaticStrategy {
    auth_type: AuthType,
    identity: Option<ExternalIdentity>,
    preflight: Value,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticStrategy {
    pub fn new(auth_type: AuthType) -> Self {
        Self {
            auth_type,
            identity: Some(sample_identity()),
            preflight: json!({"oauth_token": "request-token", "oauth_callback_confirmed": true}),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_identity(mut self, identity: ExternalIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// 认证总是被提供商拒绝
    pub fn rejecting(mut self) -> Self {
        self.identity = None;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 策略调用次数（authenticate 与 authorize 合计）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn preflight(&self) -> PreflightToken {
        PreflightToken(self.preflight.clone())
    }

    pub fn factory(&self) -> StrategyFactory {
        let strategy = self.clone();
        Arc::new(move |_config: &ProviderConfig| {
            Ok(Box::new(strategy.clone()) as Box<dyn ProviderStrategy>)
        })
    }

    async fn pause(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ProviderStrategy for StaticStrategy {
    fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    async fn authenticate(&self, _request: &AuthRequest) -> Result<ExternalIdentity> {
        self.pause().await;
        self.identity
            .clone()
            .ok_or_else(|| crate::config_error!("credentials rejected"))
    }

    async fn authorize(&self, _request: &AuthRequest) -> Result<PreflightToken> {
        self.pause().await;
        match self.auth_type {
            AuthType::OAuth1 => Ok(self.preflight()),
            AuthType::OAuth2 => Err(BrokerError::config("oauth2 has no preflight step")),
        }
    }
}

pub fn sample_identity() -> ExternalIdentity {
    ExternalIdentity::new("ext-1", "a@x.com", "Ada")
}

/// 构造包含给定策略的注册表
pub fn registry_with(entries: &[(&str, &StaticStrategy)]) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, strategy) in entries {
        registry.register(*name, strategy.factory());
    }
    registry
}
