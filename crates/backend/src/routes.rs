use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::json_rpc::{self, RpcState};
use crate::system::middleware::request_logger::request_logger;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: Arc<RpcState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/json-rpc", post(json_rpc::handle))
        .layer(middleware::from_fn(request_logger))
        .with_state(state)
}
