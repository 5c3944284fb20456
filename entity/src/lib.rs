//! # Entity 模块
//!
//! 包含社交登录相关的 Sea-ORM 实体定义

pub mod access_tokens;
pub mod user_provider_links;
pub mod users;

pub use access_tokens::Entity as AccessTokens;
pub use user_provider_links::Entity as UserProviderLinks;
pub use users::Entity as Users;
