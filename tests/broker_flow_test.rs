//! 社交登录编排流程测试
//!
//! 覆盖：
//! 1. 新用户登录建档并签发令牌
//! 2. 按邮箱合并到已有用户
//! 3. 已登录用户绑定新提供商
//! 4. `OAuth1` 预授权不触碰存储
//! 5. 解绑

mod common;

use std::sync::Arc;

use common::{ScriptedStrategy, broker, identity, local_user, oauth1_completion, preflight_token};
use pretty_assertions::assert_eq;
use social_auth::auth::AuthType;
use social_auth::store::{MemoryUserStore, UserFilter, UserStore};
use social_auth::{AuthOutcome, AuthRequest, BrokerError};

fn store() -> Arc<MemoryUserStore> {
    Arc::new(MemoryUserStore::new(1_209_600))
}

fn expect_token(outcome: AuthOutcome) -> social_auth::store::AccessToken {
    match outcome {
        AuthOutcome::Token(token) => token,
        other => panic!("expected a token, got {other:?}"),
    }
}

#[tokio::test]
async fn test_new_identity_creates_user_and_token() {
    let store = store();
    let github = ScriptedStrategy::oauth2(identity("42", "a@x.com", "Ada"));
    let broker = broker(&[("github", &github)], store.clone());

    let token = expect_token(
        broker
            .auth("github", &AuthRequest::new().with("code", "abc"), None)
            .await
            .unwrap(),
    );

    let users = store.users().await;
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user.email, "a@x.com");
    assert_eq!(user.provider_id("github"), Some("42"));
    assert_eq!(user.password.len(), 18);

    assert_eq!(token.token, token.id);
    assert_eq!(token.user_id, user.id);
    assert_eq!(token.ttl, 1_209_600);
}

#[tokio::test]
async fn test_existing_email_is_reused() {
    let store = store();
    store.insert_user(local_user(3, "a@x.com")).await;
    let github = ScriptedStrategy::oauth2(identity("42", "a@x.com", "Ada"));
    let broker = broker(&[("github", &github)], store.clone());

    let token = expect_token(broker.auth("github", &AuthRequest::new(), None).await.unwrap());

    assert_eq!(store.user_count().await, 1);
    let user = store.find_by_id(3).await.unwrap().unwrap();
    assert_eq!(user.provider_id("github"), Some("42"));
    assert_eq!(user.password, "existing-password");
    assert_eq!(user.fullname, "Ada");
    assert_eq!(token.user_id, 3);
}

#[tokio::test]
async fn test_same_email_across_providers_maps_to_one_user() {
    let store = store();
    let github = ScriptedStrategy::oauth2(identity("42", "a@x.com", "Ada"));
    let google = ScriptedStrategy::oauth2(identity("g-1", "a@x.com", "Ada L."));
    let broker = broker(&[("github", &github), ("google", &google)], store.clone());

    let first = expect_token(broker.auth("github", &AuthRequest::new(), None).await.unwrap());
    let second = expect_token(broker.auth("google", &AuthRequest::new(), None).await.unwrap());

    assert_eq!(first.user_id, second.user_id);
    let user = store.find_by_id(first.user_id).await.unwrap().unwrap();
    assert_eq!(user.provider_id("github"), Some("42"));
    assert_eq!(user.provider_id("google"), Some("g-1"));
    assert_eq!(user.fullname, "Ada");
}

#[tokio::test]
async fn test_known_caller_links_without_token() {
    let store = store();
    store.insert_user(local_user(7, "seven@x.com")).await;
    let twitter = ScriptedStrategy::oauth1(identity("tw-99", "", "seven"));
    let broker = broker(&[("twitter", &twitter)], store.clone());

    let outcome = broker
        .auth("twitter", &oauth1_completion(), Some(7))
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::Linked(true));
    let user = store.find_by_id(7).await.unwrap().unwrap();
    assert_eq!(user.provider_id("twitter"), Some("tw-99"));
    assert_eq!(user.fullname, "seven");
    assert_eq!(store.token_count().await, 0);
    assert_eq!(twitter.authorize_calls(), 0);
}

#[tokio::test]
async fn test_link_to_missing_user_fails_without_creating() {
    let store = store();
    let github = ScriptedStrategy::oauth2(identity("42", "a@x.com", "Ada"));
    let broker = broker(&[("github", &github)], store.clone());

    let err = broker
        .auth("github", &AuthRequest::new(), Some(7))
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::UserNotFound { user_id: 7 }));
    assert_eq!(store.user_count().await, 0);
}

#[tokio::test]
async fn test_oauth1_preflight_returns_raw_token() {
    let store = store();
    let twitter = ScriptedStrategy::oauth1(identity("tw-1", "", ""));
    let broker = broker(&[("twitter", &twitter)], store.clone());

    let outcome = broker
        .auth("twitter", &AuthRequest::new().with("oauth_token", "only-half"), None)
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::Preflight(preflight_token()));
    assert_eq!(twitter.authorize_calls(), 1);
    assert_eq!(twitter.authenticate_calls(), 0);
    assert_eq!(store.user_count().await, 0);
    assert_eq!(store.token_count().await, 0);
}

#[tokio::test]
async fn test_oauth1_completion_authenticates() {
    let store = store();
    let twitter = ScriptedStrategy::oauth1(identity("tw-1", "", "tw"));
    let broker = broker(&[("twitter", &twitter)], store.clone());

    let token = expect_token(broker.auth("twitter", &oauth1_completion(), None).await.unwrap());

    assert_eq!(twitter.authorize_calls(), 0);
    let user = store.find_by_id(token.user_id).await.unwrap().unwrap();
    assert_eq!(user.provider_id("twitter"), Some("tw-1"));
}

#[tokio::test]
async fn test_unlink_absent_binding_succeeds() {
    let store = store();
    store.insert_user(local_user(7, "seven@x.com")).await;
    let github = ScriptedStrategy::oauth2(identity("42", "a@x.com", "Ada"));
    let broker = broker(&[("github", &github)], store.clone());

    assert!(broker.unlink("github", 7).await.unwrap());

    let user = store.find_by_id(7).await.unwrap().unwrap();
    assert_eq!(user.provider_id("github"), None);
    assert_eq!(github.authenticate_calls(), 0);
}

#[tokio::test]
async fn test_unlinked_identity_logs_in_as_new_user() {
    let store = store();
    let github = ScriptedStrategy::oauth2(identity("42", "", "Ada"));
    let broker = broker(&[("github", &github)], store.clone());

    let first = expect_token(broker.auth("github", &AuthRequest::new(), None).await.unwrap());
    assert!(broker.unlink("github", first.user_id).await.unwrap());

    let found = store
        .find_one(&UserFilter::provider("github", "42"))
        .await
        .unwrap();
    assert!(found.is_none());

    // 没有邮箱可合并，只能新建
    let second = expect_token(broker.auth("github", &AuthRequest::new(), None).await.unwrap());
    assert_ne!(first.user_id, second.user_id);
    assert_eq!(store.user_count().await, 2);
}

#[tokio::test]
async fn test_unknown_provider_and_rejected_credentials() {
    let store = store();
    let github = ScriptedStrategy::rejecting(AuthType::OAuth2);
    let broker = broker(&[("github", &github)], store.clone());

    let err = broker.auth("myspace", &AuthRequest::new(), None).await.unwrap_err();
    assert!(matches!(err, BrokerError::UnknownProvider { .. }));
    assert_eq!(github.authenticate_calls(), 0);

    let err = broker.auth("github", &AuthRequest::new(), None).await.unwrap_err();
    assert!(matches!(err, BrokerError::UpstreamAuth { .. }));
    assert_eq!(store.user_count().await, 0);
}

#[tokio::test]
async fn test_supported_providers_description() {
    let github = ScriptedStrategy::oauth2(identity("1", "", ""));
    let twitter = ScriptedStrategy::oauth1(identity("2", "", ""));
    let broker = broker(&[("twitter", &twitter), ("github", &github), ("twitter", &github)], store());

    assert_eq!(broker.supported_providers(), "twitter, github");
    assert_eq!(broker.registry().len(), 2);
}
