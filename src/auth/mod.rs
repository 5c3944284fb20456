//! # 社交登录编排模块
//!
//! 由三部分组成：
//! - [`ProviderRegistry`]：提供商名称到策略工厂的注册表
//! - [`ProviderSession`]：单次认证尝试的会话，封装策略调用和用户对账
//! - [`AuthBroker`]：根据请求选择 authorize / link / authenticate 流程，并提供 unlink

pub mod broker;
pub mod registry;
pub mod session;
pub mod strategies;
pub mod types;

pub use broker::AuthBroker;
pub use registry::{ProviderRegistry, StrategyFactory};
pub use session::ProviderSession;
pub use strategies::{GenericOAuth2Strategy, ProviderStrategy};
pub use types::{AuthFlow, AuthOutcome, AuthRequest, AuthType, ExternalIdentity, PreflightToken};
