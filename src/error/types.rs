//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::ErrorCategory;

/// 社交登录代理的主要错误类型
#[derive(Debug, Error)]
pub enum BrokerError {
    /// 请求的提供商没有注册
    #[error("The requested provider does not exist: {provider}")]
    UnknownProvider { provider: String },

    /// 提供商拒绝了凭据或不可达
    #[error("Provider '{provider}' rejected the authentication: {message}")]
    UpstreamAuth {
        provider: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 绑定/解绑目标用户不存在
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i32 },

    /// 请求没有携带有效的访问令牌
    #[error("{message}")]
    Unauthenticated { message: String },

    /// 调用方无权操作目标用户
    #[error("Caller {caller} may not act on user {user_id}")]
    Forbidden { caller: i32, user_id: i32 },

    /// 请求参数格式错误
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// 用户存储失败
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 访问令牌签发失败
    #[error("Token issuance error: {message}")]
    TokenIssuance {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 配置相关错误
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加了上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BrokerError>,
    },
}

impl BrokerError {
    /// 错误归类：客户端错误或服务端错误
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownProvider { .. }
            | Self::UpstreamAuth { .. }
            | Self::UserNotFound { .. }
            | Self::Unauthenticated { .. }
            | Self::Forbidden { .. }
            | Self::InvalidRequest { .. } => ErrorCategory::Client,
            Self::Context { source, .. } => source.category(),
            Self::Persistence { .. }
            | Self::TokenIssuance { .. }
            | Self::Config { .. }
            | Self::Serialization { .. }
            | Self::Io { .. }
            | Self::Internal { .. } => ErrorCategory::Server,
        }
    }

    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::UnknownProvider { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_PROVIDER"),
            Self::UpstreamAuth { .. } => (StatusCode::BAD_REQUEST, "UPSTREAM_AUTH_ERROR"),
            Self::UserNotFound { .. } => (StatusCode::BAD_REQUEST, "USER_NOT_FOUND"),
            Self::Unauthenticated { .. } => (StatusCode::BAD_REQUEST, "UNAUTHENTICATED"),
            Self::Forbidden { .. } => (StatusCode::BAD_REQUEST, "FORBIDDEN"),
            Self::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            Self::Persistence { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
            Self::TokenIssuance { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ISSUANCE_ERROR")
            }
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Serialization { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 创建未知提供商错误
    pub fn unknown_provider<T: Into<String>>(provider: T) -> Self {
        Self::UnknownProvider {
            provider: provider.into(),
        }
    }

    /// 创建提供商认证错误
    pub fn upstream<P: Into<String>, T: Into<String>>(provider: P, message: T) -> Self {
        Self::UpstreamAuth {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的提供商认证错误
    pub fn upstream_with_source<P: Into<String>, T: Into<String>, E: Into<anyhow::Error>>(
        provider: P,
        message: T,
        source: E,
    ) -> Self {
        Self::UpstreamAuth {
            provider: provider.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建用户不存在错误
    #[must_use]
    pub const fn user_not_found(user_id: i32) -> Self {
        Self::UserNotFound { user_id }
    }

    /// 创建未认证错误
    pub fn unauthenticated<T: Into<String>>(message: T) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// 创建越权操作错误
    #[must_use]
    pub const fn forbidden(caller: i32, user_id: i32) -> Self {
        Self::Forbidden { caller, user_id }
    }

    /// 创建请求格式错误
    pub fn invalid_request<T: Into<String>>(message: T) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// 创建存储错误
    pub fn persistence<T: Into<String>>(message: T) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储错误
    pub fn persistence_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建令牌签发错误
    pub fn token_issuance<T: Into<String>>(message: T) -> Self {
        Self::TokenIssuance {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的令牌签发错误
    pub fn token_issuance_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::TokenIssuance {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 面向调用方的错误信息；服务端错误不暴露细节
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Server => "Internal server error".to_string(),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for BrokerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "file operation failed".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for BrokerError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("failed to parse TOML", err)
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for BrokerError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::persistence_with_source("database operation failed", err)
    }
}

// Bcrypt错误转换
impl From<bcrypt::BcryptError> for BrokerError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::persistence_with_source("password hashing failed", err)
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        let provider = err
            .url()
            .and_then(|url| url.host_str())
            .unwrap_or("unknown")
            .to_string();
        Self::upstream_with_source(provider, "provider request failed", err)
    }
}
