//! # 请求处理器

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
};
use chrono::Utc;
use serde_json::{Value, json};

use super::AppState;
use super::response::{ApiError, ProvidersResponse, UnlinkResponse};
use crate::auth::{AuthOutcome, AuthRequest};
use crate::error::{BrokerError, Result};
use crate::{
    ldebug, lwarn,
    logging::{LogComponent, LogStage},
};

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 列出支持的提供商
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.registry().list_providers().to_vec(),
        description: format!(
            "Authenticate with one of the supported social media providers. Supported are: {}",
            state.supported_providers()
        ),
    })
}

/// `POST /auth/{provider}`
pub async fn auth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<AuthOutcome> {
    let request = parse_request(&body)?;
    let caller = resolve_caller(&state, &headers, &query).await?;

    let outcome = state.auth(&provider, &request, caller).await?;
    Ok(Json(outcome))
}

/// `PUT|POST /{id}/link/{provider}`，只允许用户本人调用
pub async fn link_user(
    State(state): State<AppState>,
    Path((id, provider)): Path<(i32, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<AuthOutcome> {
    require_owner(&state, &headers, &query, id).await?;
    let request = parse_request(&body)?;

    let outcome = state.auth(&provider, &request, Some(id)).await?;
    Ok(Json(outcome))
}

/// `GET|DELETE /auth/unlink/{provider}`，解绑当前令牌对应的用户
pub async fn unlink_current(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<UnlinkResponse> {
    let user_id = require_caller(&state, &headers, &query).await?;

    let success = state.unlink(&provider, user_id).await?;
    Ok(Json(UnlinkResponse { success }))
}

/// `GET|DELETE /{id}/unlink/{provider}`，只允许用户本人调用
pub async fn unlink_user(
    State(state): State<AppState>,
    Path((id, provider)): Path<(i32, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<UnlinkResponse> {
    require_owner(&state, &headers, &query, id).await?;

    let success = state.unlink(&provider, id).await?;
    Ok(Json(UnlinkResponse { success }))
}

/// 解析请求体，空请求体视为空参数
fn parse_request(body: &Bytes) -> Result<AuthRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuthRequest::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| BrokerError::invalid_request(format!("request body is not valid JSON: {e}")))?;
    AuthRequest::from_value(value)
}

/// 要求请求携带有效访问令牌
async fn require_caller(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<i32> {
    resolve_caller(state, headers, query)
        .await?
        .ok_or_else(|| BrokerError::unauthenticated("Did not receive a valid access token"))
}

/// 要求调用方就是路径中的用户
async fn require_owner(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    user_id: i32,
) -> Result<()> {
    let caller = require_caller(state, headers, query).await?;
    if caller != user_id {
        lwarn!(
            "system",
            LogStage::Request,
            LogComponent::Server,
            "owner_mismatch",
            &format!("Caller {caller} tried to act on user {user_id}")
        );
        return Err(BrokerError::forbidden(caller, user_id));
    }
    Ok(())
}

/// 从 `Authorization: Bearer` 或 `access_token` 查询参数解析调用方
///
/// 令牌不存在或已过期时视为匿名调用
async fn resolve_caller(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Option<i32>> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());
    let Some(token_id) = bearer
        .or_else(|| query.get("access_token").map(String::as_str))
        .filter(|token| !token.is_empty())
    else {
        return Ok(None);
    };

    let token = state.users().find_access_token(token_id).await?;
    let caller = token
        .filter(|token| token.is_valid_at(Utc::now()))
        .map(|token| token.user_id);

    if caller.is_none() {
        ldebug!(
            "system",
            LogStage::Request,
            LogComponent::Server,
            "caller_rejected",
            "Access token unknown or expired, treating request as anonymous"
        );
    }

    Ok(caller)
}
