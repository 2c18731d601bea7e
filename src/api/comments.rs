use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Admin, NoFields, required};
use crate::{
    captcha::ChallengeVerifier,
    content::{Comment, NewComment, PostId},
    error::{Error, Result},
    state::AppState,
    storage::{AdminComment, CommentStore, PostRepository},
};

/// 管理后台“最近评论”的条数
const RECENT_LIMIT: usize = 10;

/// 配置评论相关路由。
///
/// - `POST /user/chat/new`：访客提交评论
/// - `POST /admin/comment/{list,recent,get,edit/{id},delete/{id}}`：需要令牌
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/user/chat/new", post(comment_new))
        .route("/admin/comment/list", post(comment_list))
        .route("/admin/comment/recent", post(comment_recent))
        .route("/admin/comment/get", post(comment_get))
        .route("/admin/comment/edit/{id}", post(comment_edit))
        .route("/admin/comment/delete/{id}", post(comment_delete))
}

/// 访客提交的评论字段
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Submission {
    post_id: Option<Value>,
    name: Option<String>,
    email: Option<String>,
    text: Option<String>,
    date: Option<String>,
    parent_id: Option<String>,
    hcaptcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct Submitted {
    success: bool,
    comment: Comment,
}

/// 提交评论。
///
/// 先校验必填字段，再做人机验证，最后写入。
async fn comment_new(
    State(store): State<CommentStore>,
    State(captcha): State<ChallengeVerifier>,
    Json(sub): Json<Submission>,
) -> Result<Json<Submitted>> {
    let post_id = sub
        .post_id
        .and_then(|v| serde_json::from_value::<PostId>(v).ok());
    let new = NewComment::new(
        post_id,
        sub.name,
        sub.email,
        sub.text,
        sub.date,
        sub.parent_id,
    )?;

    captcha.verify(sub.hcaptcha_token.as_deref()).await?;

    let comment = store.append(new).await?;
    Ok(Json(Submitted {
        success: true,
        comment,
    }))
}

async fn comment_list(
    State(store): State<CommentStore>,
    State(posts): State<PostRepository>,
    _: Admin<NoFields>,
) -> Result<Json<Vec<AdminComment>>> {
    Ok(Json(store.admin_list(&posts).await?))
}

async fn comment_recent(
    State(store): State<CommentStore>,
    State(posts): State<PostRepository>,
    _: Admin<NoFields>,
) -> Result<Json<Vec<AdminComment>>> {
    Ok(Json(store.recent(&posts, RECENT_LIMIT).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdParams {
    id: Option<String>,
}

/// 单条评论详情
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentDetail {
    id: String,
    content: String,
    author: String,
    cdate: String,
    post_id: PostId,
}

async fn comment_get(
    Query(params): Query<IdParams>,
    State(store): State<CommentStore>,
    _: Admin<NoFields>,
) -> Result<Json<CommentDetail>> {
    let id = required(params.id, "Comment id is required")?;

    let (post_id, found) = store.find(&id).await?.ok_or(Error::NotFound)?;
    Ok(Json(CommentDetail {
        id: found.id,
        content: found.text,
        author: found.name,
        cdate: found.date,
        post_id,
    }))
}

#[derive(Debug, Deserialize)]
struct EditForm {
    content: Option<String>,
}

async fn comment_edit(
    Path(id): Path<String>,
    State(store): State<CommentStore>,
    Admin(form): Admin<EditForm>,
) -> Result<Json<Value>> {
    let content = required(form.content, "Comment content is required")?;

    store.edit(&id, &content).await?;
    Ok(Json(json!({ "ok": true })))
}

async fn comment_delete(
    Path(id): Path<String>,
    State(store): State<CommentStore>,
    _: Admin<NoFields>,
) -> Result<Json<Value>> {
    store.delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
