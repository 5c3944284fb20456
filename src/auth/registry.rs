//! # 提供商注册表
//!
//! 提供商名称到策略工厂的映射。注册是幂等的：同名提供商第一次注册生效，
//! 之后的注册被忽略；枚举顺序即注册顺序

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::auth::strategies::ProviderStrategy;
use crate::config::ProviderConfig;
use crate::error::{BrokerError, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// 策略工厂：根据提供商配置构造一个新的策略实例
pub type StrategyFactory =
    Arc<dyn Fn(&ProviderConfig) -> Result<Box<dyn ProviderStrategy>> + Send + Sync>;

/// 提供商注册表
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: HashMap<String, StrategyFactory>,
    order: Vec<String>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册提供商，名称已存在时不做任何修改
    pub fn register(&mut self, name: impl Into<String>, factory: StrategyFactory) {
        let name = name.into();
        if self.factories.contains_key(&name) {
            ldebug!(
                "system",
                LogStage::Registration,
                LogComponent::Registry,
                "register_skipped",
                &format!("Provider {name} already registered, keeping the first factory")
            );
            return;
        }

        self.order.push(name.clone());
        self.factories.insert(name, factory);
    }

    /// 用闭包注册提供商
    pub fn register_fn<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderConfig) -> Result<Box<dyn ProviderStrategy>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory));
    }

    /// 按注册顺序列出提供商名称
    #[must_use]
    pub fn list_providers(&self) -> &[String] {
        &self.order
    }

    /// 人类可读的提供商列表，如 `"github, twitter"`
    #[must_use]
    pub fn supported_providers(&self) -> String {
        self.order.join(", ")
    }

    /// 查找提供商的策略工厂
    pub fn resolve(&self, name: &str) -> Result<StrategyFactory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| BrokerError::unknown_provider(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.order)
            .finish_non_exhaustive()
    }
}
