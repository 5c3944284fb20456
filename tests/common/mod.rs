//! 集成测试共用的策略桩和装配函数

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use social_auth::auth::{
    AuthBroker, AuthType, ExternalIdentity, PreflightToken, ProviderRegistry, ProviderStrategy,
    StrategyFactory,
};
use social_auth::config::ProviderConfig;
use social_auth::store::{LocalUser, MemoryUserStore};
use social_auth::{AuthRequest, BrokerError, Result};

/// 返回预设身份的策略桩
#[derive(Clone)]
pub struct ScriptedStrategy {
    auth_type: AuthType,
    identity: Option<ExternalIdentity>,
    authenticate_calls: Arc<AtomicUsize>,
    authorize_calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    pub fn oauth2(identity: ExternalIdentity) -> Self {
        Self::new(AuthType::OAuth2, Some(identity))
    }

    pub fn oauth1(identity: ExternalIdentity) -> Self {
        Self::new(AuthType::OAuth1, Some(identity))
    }

    pub fn rejecting(auth_type: AuthType) -> Self {
        Self::new(auth_type, None)
    }

    fn new(auth_type: AuthType, identity: Option<ExternalIdentity>) -> Self {
        Self {
            auth_type,
            identity,
            authenticate_calls: Arc::new(AtomicUsize::new(0)),
            authorize_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn factory(&self) -> StrategyFactory {
        let strategy = self.clone();
        Arc::new(move |_config: &ProviderConfig| {
            Ok(Box::new(strategy.clone()) as Box<dyn ProviderStrategy>)
        })
    }
}

#[async_trait]
impl ProviderStrategy for ScriptedStrategy {
    fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    async fn authenticate(&self, _request: &AuthRequest) -> Result<ExternalIdentity> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.identity
            .clone()
            .ok_or_else(|| BrokerError::upstream("scripted", "invalid credentials"))
    }

    async fn authorize(&self, _request: &AuthRequest) -> Result<PreflightToken> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(preflight_token())
    }
}

pub fn preflight_token() -> PreflightToken {
    PreflightToken(json!({
        "oauth_token": "request-token",
        "oauth_token_secret": "request-secret",
        "oauth_callback_confirmed": "true"
    }))
}

pub fn identity(id: &str, email: &str, name: &str) -> ExternalIdentity {
    ExternalIdentity::new(id, email, name)
}

pub fn local_user(id: i32, email: &str) -> LocalUser {
    LocalUser {
        id,
        email: email.to_string(),
        fullname: String::new(),
        password: "existing-password".to_string(),
        providers: BTreeMap::new(),
    }
}

pub fn registry(entries: &[(&str, &ScriptedStrategy)]) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, strategy) in entries {
        registry.register(*name, strategy.factory());
    }
    registry
}

pub fn broker(entries: &[(&str, &ScriptedStrategy)], store: Arc<MemoryUserStore>) -> AuthBroker {
    AuthBroker::new(Arc::new(registry(entries)), store, Vec::new())
}

pub fn oauth1_completion() -> AuthRequest {
    AuthRequest::new()
        .with("oauth_token", "request-token")
        .with("oauth_verifier", "verifier")
}
