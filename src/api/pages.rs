use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::get,
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    content::PostId,
    error::{Error, Result},
    render::{Renderer, html},
    state::AppState,
    storage::categories_of,
};

/// 配置页面路由。
///
/// - `GET /`、`GET /list`：文章列表，可按 `category` 过滤
/// - `GET /post/{id}`：文章页
/// - `GET /post?id=`：旧链接，301 跳转到 `/post/{id}`
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/list", get(list))
        .route("/post", get(legacy_post))
        .route("/post/{id}", get(post))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    category: Option<String>,
}

async fn list(Query(params): Query<ListParams>, State(app): State<AppState>) -> Result<Html<String>> {
    let summaries = app.posts().summaries(None).await?;
    let categories = categories_of(&summaries);

    let selected = params.category.as_deref().filter(|c| !c.is_empty());
    let visible: Vec<_> = summaries
        .into_iter()
        .filter(|s| selected.is_none_or(|c| s.tag == c))
        .collect();

    Ok(Html(html::list_page(
        &app.config().site,
        &visible,
        &categories,
        selected,
    )?))
}

async fn post(Path(id): Path<String>, State(app): State<AppState>) -> Result<Html<String>> {
    let id: PostId = id.parse()?;
    let post = app.posts().get(id).await?.ok_or(Error::NotFound)?;

    let body_html = app.renderer().render(&post.body).await?;
    let forest = app.comments().forest(id).await;

    let site_key = app.config().hcaptcha.as_ref().map(|k| k.site_key.as_str());
    Ok(Html(html::post_page(
        &app.config().site,
        &post,
        &body_html,
        &forest,
        site_key,
    )?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyParams {
    id: Option<String>,
}

async fn legacy_post(Query(params): Query<LegacyParams>) -> Result<impl IntoResponse> {
    let id: PostId = params
        .id
        .ok_or(Error::Validation("Invalid post id"))?
        .parse()?;
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, format!("/post/{id}"))],
    ))
}
