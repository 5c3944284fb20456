//! # 组件装配
//!
//! 根据配置构建注册表、用户存储和编排器

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthBroker, GenericOAuth2Strategy, ProviderRegistry, ProviderStrategy, StrategyFactory};
use crate::config::AppConfig;
use crate::database::{init_database, run_migrations};
use crate::error::{Context, Result};
use crate::store::{DatabaseUserStore, UserStore};
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 构建提供商注册表
///
/// `custom` 中的工厂先注册，同名时优先于配置中的内置策略
pub fn build_registry(
    config: &AppConfig,
    custom: impl IntoIterator<Item = (String, StrategyFactory)>,
) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, factory) in custom {
        registry.register(name, factory);
    }

    let http_client = reqwest::Client::new();
    for (name, provider) in &config.providers {
        if registry.contains(name) {
            continue;
        }
        if !provider.is_oauth2() {
            lwarn!(
                "system",
                LogStage::Registration,
                LogComponent::Registry,
                "no_builtin_strategy",
                &format!(
                    "Provider {name} uses strategy '{}' which has no built-in implementation; skipped",
                    provider.strategy
                )
            );
            continue;
        }

        let provider_name = name.clone();
        let client = http_client.clone();
        registry.register_fn(name.clone(), move |config| {
            let strategy = GenericOAuth2Strategy::from_config(&provider_name, config, client.clone())?;
            Ok(Box::new(strategy) as Box<dyn ProviderStrategy>)
        });
    }

    linfo!(
        "system",
        LogStage::Registration,
        LogComponent::Registry,
        "registry_ready",
        &format!("Supported are: {}", registry.supported_providers())
    );

    registry
}

/// 连接数据库、执行迁移并创建用户存储
pub async fn build_user_store(config: &AppConfig) -> Result<Arc<dyn UserStore>> {
    let db = init_database(&config.database)
        .await
        .context("初始化用户数据库")?;
    run_migrations(&db).await.context("执行用户数据库迁移")?;
    Ok(Arc::new(DatabaseUserStore::new(db, config.auth.ttl)))
}

/// 创建编排器
#[must_use]
pub fn build_broker(
    config: &AppConfig,
    registry: ProviderRegistry,
    users: Arc<dyn UserStore>,
) -> AuthBroker {
    AuthBroker::new(Arc::new(registry), users, config.providers.clone())
        .with_strategy_timeout(config.auth.strategy_timeout_secs.map(Duration::from_secs))
}
