//! # 提供商策略模块
//!
//! 策略负责与具体提供商交换凭据。内置一个由配置驱动的通用 OAuth2 策略，
//! 其余提供商通过注册表注入自定义策略工厂

pub mod oauth2;
pub mod traits;

pub use oauth2::GenericOAuth2Strategy;
pub use traits::ProviderStrategy;
