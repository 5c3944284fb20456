//! # Social Auth Library
//!
//! 社交登录（OAuth1/OAuth2）代理核心库：提供商注册表、单次认证会话、
//! authorize / link / authenticate 编排以及解绑流程

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod server;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use auth::{AuthBroker, AuthOutcome, AuthRequest, ProviderRegistry, ProviderSession};
pub use config::AppConfig;
pub use error::{BrokerError, Result};
