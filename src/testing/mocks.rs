//! # 测试 Mock 对象

use async_trait::async_trait;
use mockall::mock;

use crate::error::Result;
use crate::store::{AccessToken, LocalUser, NewUser, UserFilter, UserStore};

mock! {
    pub UserStore {}

    #[async_trait]
    impl UserStore for UserStore {
        async fn find_one(&self, filter: &UserFilter) -> Result<Option<LocalUser>>;
        async fn find_by_id(&self, id: i32) -> Result<Option<LocalUser>>;
        async fn create(&self, user: NewUser) -> Result<LocalUser>;
        async fn save(&self, user: &LocalUser) -> Result<LocalUser>;
        async fn create_access_token(&self, user: &LocalUser, ttl: i64) -> Result<AccessToken>;
        async fn find_access_token(&self, id: &str) -> Result<Option<AccessToken>>;
        fn token_ttl(&self) -> i64;
    }
}
