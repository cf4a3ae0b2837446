//! HTTP Server
//!
//! 组装路由与中间件，监听地址直到收到关闭信号

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 只接收 JSON 请求体，自定义提示词也不会很长
const REQUEST_BODY_LIMIT: usize = 256 * 1024;

/// 浏览器缓存预检结果的时间
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

pub struct HttpServer {
    addr: String,
    state: Arc<AppState>,
}

impl HttpServer {
    /// `addr` 形如 `0.0.0.0:8080`
    pub fn new(addr: impl Into<String>, state: AppState) -> Self {
        Self {
            addr: addr.into(),
            state: Arc::new(state),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// 路由加上请求体上限、状态码日志、请求追踪和 CORS
    pub fn build_router(&self) -> Router {
        // 前端与服务分开部署，任意来源都可访问
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .max_age(CORS_MAX_AGE);

        create_routes()
            .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 监听并服务，`shutdown` 完成后停止接收新连接
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let listener = TcpListener::bind(&self.addr).await?;
        tracing::info!(addr = %self.addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
