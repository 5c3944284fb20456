//! # API 响应结构

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, ErrorCategory};
use crate::{
    lerror,
    logging::{LogComponent, LogStage},
};

/// # 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// # 标准错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

/// # 解绑响应
#[derive(Debug, Serialize, Deserialize)]
pub struct UnlinkResponse {
    pub success: bool,
}

/// # 提供商列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
    pub description: String,
}

/// 处理器错误，转换为标准错误响应
#[derive(Debug)]
pub struct ApiError(pub BrokerError);

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.0.to_http_response_parts();

        if self.0.category() == ErrorCategory::Server {
            lerror!(
                "system",
                LogStage::Request,
                LogComponent::Server,
                "request_failed",
                &format!("{:#}", anyhow::Error::new(self.0).context(code))
            );
            let body = ErrorResponse {
                error: ErrorInfo {
                    code: code.to_string(),
                    message: "Internal server error".to_string(),
                },
            };
            return (status, Json(body)).into_response();
        }

        let body = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
