//! # 内存用户存储
//!
//! 进程内的 [`UserStore`] 实现，用于开发环境和测试

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AccessToken, LocalUser, NewUser, UserFilter, UserStore};
use crate::error::Result;

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: HashMap<i32, LocalUser>,
    tokens: HashMap<String, AccessToken>,
}

/// 内存用户存储
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
    ttl: i64,
}

impl MemoryUserStore {
    /// 创建新的内存存储
    #[must_use]
    pub fn new(ttl: i64) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                ..MemoryState::default()
            }),
            ttl,
        }
    }

    /// 当前用户数量
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// 当前已签发的令牌数量
    pub async fn token_count(&self) -> usize {
        self.state.read().await.tokens.len()
    }

    /// 所有用户，按ID排序
    pub async fn users(&self) -> Vec<LocalUser> {
        let state = self.state.read().await;
        let mut users: Vec<LocalUser> = state.users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        users
    }

    /// 以指定ID写入用户，覆盖同ID的已有用户
    pub async fn insert_user(&self, user: LocalUser) {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(user.id + 1);
        state.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<LocalUser>> {
        let state = self.state.read().await;
        // 与数据库实现保持一致：多条匹配时取ID最小的
        Ok(state
            .users
            .values()
            .filter(|user| filter.matches(user))
            .min_by_key(|user| user.id)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<LocalUser>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<LocalUser> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        let created = LocalUser {
            id,
            email: user.email,
            fullname: user.fullname,
            password: user.password,
            providers: user.providers,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn save(&self, user: &LocalUser) -> Result<LocalUser> {
        let mut state = self.state.write().await;
        let slot = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| crate::persistence_error!("user {} no longer exists", user.id))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn create_access_token(&self, user: &LocalUser, ttl: i64) -> Result<AccessToken> {
        let token = AccessToken::issue(user.id, ttl);
        let mut state = self.state.write().await;
        // 签发时顺带清理已过期的令牌
        let now = token.created;
        state.tokens.retain(|_, existing| existing.is_valid_at(now));
        state.tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn find_access_token(&self, id: &str) -> Result<Option<AccessToken>> {
        Ok(self.state.read().await.tokens.get(id).cloned())
    }

    fn token_ttl(&self) -> i64 {
        self.ttl
    }
}
