use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Admin, NoFields};
use crate::{
    content::{PostDraft, PostId},
    error::{Error, Result},
    state::AppState,
    storage::{PostRepository, PostSummary},
};

/// 配置文章相关路由。
///
/// - `GET /user/post/list/{limit}`：最新的 `limit` 篇文章
/// - `GET /user/post/get?id=`：文章原始内容
/// - `POST /admin/post/new`、`/admin/post/edit/{id}`、`/admin/post/delete/{id}`：需要令牌
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/user/post/list/{limit}", get(post_list))
        .route("/user/post/get", get(post_raw))
        .route("/admin/post/new", post(post_new))
        .route("/admin/post/edit/{id}", post(post_edit))
        .route("/admin/post/delete/{id}", post(post_delete))
}

async fn post_list(
    Path(limit): Path<String>,
    State(posts): State<PostRepository>,
) -> Result<Json<Vec<PostSummary>>> {
    let limit: usize = limit
        .parse()
        .map_err(|_| Error::Validation("Invalid limit"))?;
    Ok(Json(posts.summaries(Some(limit)).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdParams {
    id: Option<String>,
}

async fn post_raw(
    Query(params): Query<IdParams>,
    State(posts): State<PostRepository>,
) -> Result<impl IntoResponse> {
    let id: PostId = params
        .id
        .ok_or(Error::Validation("Invalid post id"))?
        .parse()?;
    let raw = posts.raw(id).await?.ok_or(Error::NotFound)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], raw))
}

/// 新建与编辑文章时提交的字段
#[derive(Debug, Deserialize)]
struct PostForm {
    title: Option<String>,
    tag: Option<String>,
    body: Option<String>,
}

impl PostForm {
    fn into_draft(self) -> Result<PostDraft> {
        PostDraft::new(
            self.title.as_deref(),
            self.tag.as_deref(),
            self.body.as_deref(),
        )
    }
}

async fn post_new(
    State(posts): State<PostRepository>,
    Admin(form): Admin<PostForm>,
) -> Result<Json<Value>> {
    let draft = form.into_draft()?;
    let id = posts.create(draft).await?;
    Ok(Json(json!({ "id": id })))
}

async fn post_edit(
    Path(id): Path<String>,
    State(posts): State<PostRepository>,
    Admin(form): Admin<PostForm>,
) -> Result<Json<Value>> {
    let id: PostId = id.parse()?;
    posts.edit(id, form.into_draft()?).await?;
    Ok(Json(json!({ "ok": true })))
}

async fn post_delete(
    Path(id): Path<String>,
    State(posts): State<PostRepository>,
    _: Admin<NoFields>,
) -> Result<Json<Value>> {
    let id: PostId = id.parse()?;
    posts.delete(id).await?;
    Ok(Json(json!({ "ok": true })))
}
