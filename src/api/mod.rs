mod admin;
mod comments;
mod pages;
mod posts;

use std::net::SocketAddr;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRef, FromRequest, Request},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::{
    auth::Authenticator,
    error::{Error, Result},
    state::AppState,
};

/// 请求体上限，文章正文可能较大
const BODY_LIMIT: usize = 32 * 1024 * 1024;

/// 设置应用的路由。
///
/// 页面路由挂在根路径，JSON 接口挂在 `/api` 下，并绑定应用状态。
pub fn setup_route(app: AppState) -> Router {
    Router::new()
        .merge(pages::setup_route())
        .nest(
            "/api",
            posts::setup_route()
                .merge(comments::setup_route())
                .merge(admin::setup_route()),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(app)
}

/// 启动 HTTP 服务，并使用给定的路由处理请求。
#[instrument(name = "http server", skip_all)]
pub async fn run_server_with_router(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "listening");

    axum::serve(listener, router).await
}

/// 启动 HTTP 服务，自动设置路由和中间件。
///
/// 1. 生成路由
/// 2. 添加日志和追踪中间件
/// 3. 启动服务器
pub async fn run_server(app: AppState) -> std::io::Result<()> {
    let addr = app.config().addr;
    let router = setup_route(app);
    let router = add_middlewares(router);
    run_server_with_router(router, addr).await
}

/// 为路由添加中间件，包括请求追踪和失败日志记录。
///
/// 日志记录会在请求失败时输出错误信息。
fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(|_req: &_, _span: &tracing::Span| {
                // 空实现，关闭请求日志
            }),
    )
}

/// 管理接口的请求体：`token` 字段 + 具体接口的字段。
///
/// 先按任意 JSON 读取并校验 `token`，通过后才解析接口字段。
/// 请求体缺失、不是 JSON、或 `token` 不是字符串时一律返回未授权，
/// 未授权的调用方看不到字段格式错误。
struct Admin<T>(T);

impl<S, T> FromRequest<S> for Admin<T>
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| Error::Unauthorized)?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Authenticator::from_ref(state).check(body.get("token"))?;

        serde_json::from_value(body)
            .map(Admin)
            .map_err(|_| Error::Validation("Invalid request body"))
    }
}

/// 没有额外字段的管理请求
#[derive(Debug, Deserialize)]
struct NoFields {}

/// 非空字符串字段
fn required(field: Option<String>, message: &'static str) -> Result<String> {
    field.filter(|s| !s.is_empty()).ok_or(Error::Validation(message))
}
