use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};

use super::{Admin, NoFields};
use crate::{config::Config, error::Result, state::AppState};

/// 配置站点信息与令牌校验路由。
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/admin/verify", post(verify))
        .route("/site/meta", get(site_meta))
}

/// 校验令牌，供管理后台登录时调用。
async fn verify(_: Admin<NoFields>) -> Result<Json<Value>> {
    Ok(Json(json!({ "ok": true })))
}

async fn site_meta(State(config): State<Arc<Config>>) -> Json<Value> {
    Json(json!({ "title": config.site.blog_name }))
}
