//! # 本地用户存储
//!
//! 社交登录只依赖这里定义的 [`UserStore`] 协作接口：按条件查找用户、
//! 创建/保存用户、签发访问令牌。内置两个实现：
//! - [`MemoryUserStore`]：进程内存储，适合开发和测试
//! - [`DatabaseUserStore`]：基于 Sea-ORM 的 SQLite 存储

pub mod database;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use database::DatabaseUserStore;
pub use memory::MemoryUserStore;

/// 访问令牌ID长度
pub const ACCESS_TOKEN_ID_LENGTH: usize = 64;

/// 本地用户
///
/// `providers` 以提供商名称为键，保存该提供商下的外部用户ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: i32,
    pub email: String,
    pub fullname: String,
    /// 存储层保存的密码（数据库实现中为哈希值），永不返回给调用方
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub providers: BTreeMap<String, String>,
}

impl LocalUser {
    /// 获取某个提供商下绑定的外部用户ID
    #[must_use]
    pub fn provider_id(&self, provider: &str) -> Option<&str> {
        self.providers.get(provider).map(String::as_str)
    }

    /// 绑定提供商外部ID，覆盖已有绑定
    pub fn bind_provider(&mut self, provider: &str, external_id: &str) {
        self.providers
            .insert(provider.to_string(), external_id.to_string());
    }

    /// 解除提供商绑定，返回之前的外部ID
    pub fn unbind_provider(&mut self, provider: &str) -> Option<String> {
        self.providers.remove(provider)
    }

    /// 仅当全名为空时填充
    pub fn fill_fullname(&mut self, display_name: &str) {
        if self.fullname.is_empty() {
            self.fullname = display_name.to_string();
        }
    }
}

/// 新建用户请求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub providers: BTreeMap<String, String>,
}

/// 用户查找条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// 按提供商绑定查找
    Provider {
        provider: String,
        external_id: String,
    },
    /// 按邮箱查找
    Email(String),
}

impl UserFilter {
    pub fn provider(provider: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            external_id: external_id.into(),
        }
    }

    /// 判断用户是否满足条件
    #[must_use]
    pub fn matches(&self, user: &LocalUser) -> bool {
        match self {
            Self::Provider {
                provider,
                external_id,
            } => user.provider_id(provider) == Some(external_id.as_str()),
            Self::Email(email) => user.email == *email,
        }
    }
}

/// 本地访问令牌
///
/// 存储层只负责 `id`；对外返回前通过 [`AccessToken::aliased`] 把 `token`
/// 设为 `id` 的别名，两个字段都会序列化，兼容读取任一字段的客户端
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: String,
    #[serde(default)]
    pub token: String,
    /// 有效期（秒）
    pub ttl: i64,
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub created: DateTime<Utc>,
}

impl AccessToken {
    /// 生成一个新的随机令牌记录
    #[must_use]
    pub fn issue(user_id: i32, ttl: i64) -> Self {
        Self {
            id: random_string(ACCESS_TOKEN_ID_LENGTH),
            token: String::new(),
            ttl,
            user_id,
            created: Utc::now(),
        }
    }

    /// 把 `token` 字段设为 `id` 的别名
    #[must_use]
    pub fn aliased(mut self) -> Self {
        self.token.clone_from(&self.id);
        self
    }

    /// 令牌是否仍在有效期内
    ///
    /// 过期时间超出可表示范围的令牌一律视为无效
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        Duration::try_seconds(self.ttl)
            .and_then(|ttl| self.created.checked_add_signed(ttl))
            .is_some_and(|expires_at| expires_at > now)
    }
}

/// 本地用户存储协作接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 按条件查找第一个匹配的用户
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<LocalUser>>;

    /// 按ID查找用户
    async fn find_by_id(&self, id: i32) -> Result<Option<LocalUser>>;

    /// 创建用户
    async fn create(&self, user: NewUser) -> Result<LocalUser>;

    /// 保存用户（包括提供商绑定的增删）
    async fn save(&self, user: &LocalUser) -> Result<LocalUser>;

    /// 为用户签发访问令牌
    async fn create_access_token(&self, user: &LocalUser, ttl: i64) -> Result<AccessToken>;

    /// 按令牌ID查找访问令牌
    async fn find_access_token(&self, id: &str) -> Result<Option<AccessToken>>;

    /// 配置的令牌有效期（秒）
    fn token_ttl(&self) -> i64;
}

/// 生成随机字母数字串
#[must_use]
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
