//! # 数据库用户存储
//!
//! 基于 Sea-ORM 的 [`UserStore`] 实现。提供商绑定保存在
//! `user_provider_links` 表中，每个绑定一行

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::{
    AccessTokens, UserProviderLinks, Users, access_tokens, user_provider_links, users,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{AccessToken, LocalUser, NewUser, UserFilter, UserStore};
use crate::error::{BrokerError, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// 数据库用户存储
pub struct DatabaseUserStore {
    db: DatabaseConnection,
    ttl: i64,
    bcrypt_cost: u32,
}

impl DatabaseUserStore {
    /// 创建新的数据库存储
    #[must_use]
    pub const fn new(db: DatabaseConnection, ttl: i64) -> Self {
        Self {
            db,
            ttl,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// 设置密码哈希强度
    #[must_use]
    pub const fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// 加载用户及其提供商绑定
    async fn load_user(&self, model: users::Model) -> Result<LocalUser> {
        let links = UserProviderLinks::find()
            .filter(user_provider_links::Column::UserId.eq(model.id))
            .all(&self.db)
            .await?;

        let providers = links
            .into_iter()
            .map(|link| (link.provider, link.external_id))
            .collect::<BTreeMap<_, _>>();

        Ok(LocalUser {
            id: model.id,
            email: model.email,
            fullname: model.fullname,
            password: model.password_hash,
            providers,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| BrokerError::internal_with_source("password hashing task failed", e))?
            .map_err(Into::into)
    }
}

#[async_trait]
impl UserStore for DatabaseUserStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<LocalUser>> {
        let model = match filter {
            UserFilter::Provider {
                provider,
                external_id,
            } => {
                let link = UserProviderLinks::find()
                    .filter(user_provider_links::Column::Provider.eq(provider.as_str()))
                    .filter(user_provider_links::Column::ExternalId.eq(external_id.as_str()))
                    .order_by_asc(user_provider_links::Column::UserId)
                    .one(&self.db)
                    .await?;
                match link {
                    Some(link) => Users::find_by_id(link.user_id).one(&self.db).await?,
                    None => None,
                }
            }
            UserFilter::Email(email) => {
                Users::find()
                    .filter(users::Column::Email.eq(email.as_str()))
                    .order_by_asc(users::Column::Id)
                    .one(&self.db)
                    .await?
            }
        };

        match model {
            Some(model) => Ok(Some(self.load_user(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<LocalUser>> {
        match Users::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.load_user(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: NewUser) -> Result<LocalUser> {
        let password_hash = self.hash_password(user.password).await?;
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let model = users::ActiveModel {
            email: Set(user.email),
            fullname: Set(user.fullname),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (provider, external_id) in &user.providers {
            user_provider_links::ActiveModel {
                user_id: Set(model.id),
                provider: Set(provider.clone()),
                external_id: Set(external_id.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        ldebug!(
            "system",
            LogStage::Db,
            LogComponent::UserStore,
            "user_created",
            &format!("created user {}", model.id)
        );

        Ok(LocalUser {
            id: model.id,
            email: model.email,
            fullname: model.fullname,
            password: model.password_hash,
            providers: user.providers,
        })
    }

    async fn save(&self, user: &LocalUser) -> Result<LocalUser> {
        let existing = Users::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| crate::persistence_error!("user {} no longer exists", user.id))?;

        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let mut active: users::ActiveModel = existing.into();
        active.email = Set(user.email.clone());
        active.fullname = Set(user.fullname.clone());
        active.updated_at = Set(now);
        active.update(&txn).await?;

        // 绑定整体重写，删除的提供商随之消失
        UserProviderLinks::delete_many()
            .filter(user_provider_links::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;

        for (provider, external_id) in &user.providers {
            user_provider_links::ActiveModel {
                user_id: Set(user.id),
                provider: Set(provider.clone()),
                external_id: Set(external_id.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        Ok(user.clone())
    }

    async fn create_access_token(&self, user: &LocalUser, ttl: i64) -> Result<AccessToken> {
        let token = AccessToken::issue(user.id, ttl);

        access_tokens::ActiveModel {
            id: Set(token.id.clone()),
            user_id: Set(token.user_id),
            ttl: Set(token.ttl),
            created_at: Set(token.created.naive_utc()),
        }
        .insert(&self.db)
        .await?;

        Ok(token)
    }

    async fn find_access_token(&self, id: &str) -> Result<Option<AccessToken>> {
        let model = AccessTokens::find_by_id(id.to_string())
            .one(&self.db)
            .await?;

        Ok(model.map(|model| AccessToken {
            id: model.id,
            token: String::new(),
            ttl: model.ttl,
            user_id: model.user_id,
            created: DateTime::<Utc>::from_naive_utc_and_offset(model.created_at, Utc),
        }))
    }

    fn token_ttl(&self) -> i64 {
        self.ttl
    }
}
