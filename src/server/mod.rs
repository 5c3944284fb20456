//! # HTTP 服务
//!
//! 在编排器之上提供一层薄的 axum 路由

pub mod handlers;
pub mod response;
pub mod routes;

use std::ops::Deref;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::AuthBroker;
use crate::config::ServerConfig;
use crate::error::{BrokerError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

pub use routes::create_router;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    broker: Arc<AuthBroker>,
}

impl AppState {
    #[must_use]
    pub const fn new(broker: Arc<AuthBroker>) -> Self {
        Self { broker }
    }
}

impl Deref for AppState {
    type Target = AuthBroker;

    fn deref(&self) -> &Self::Target {
        &self.broker
    }
}

/// 启动 HTTP 服务，收到 Ctrl-C 后优雅退出
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await.map_err(|e| {
        BrokerError::config_with_source(format!("无法监听地址: {address}"), e)
    })?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Server,
        "listening",
        &format!("Listening on {address}; supported are: {}", state.supported_providers())
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Server,
        "stopped",
        "HTTP server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::Server,
            "signal",
            "Received shutdown signal"
        );
    }
}
