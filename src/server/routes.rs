//! # 路由配置

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers;

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/auth", auth_routes())
        .route(
            "/{id}/unlink/{provider}",
            get(handlers::unlink_user).delete(handlers::unlink_user),
        )
        .route(
            "/{id}/link/{provider}",
            post(handlers::link_user).put(handlers::link_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 社交登录路由
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/providers", get(handlers::list_providers))
        .route(
            "/unlink/{provider}",
            get(handlers::unlink_current).delete(handlers::unlink_current),
        )
        .route("/{provider}", post(handlers::auth))
}
