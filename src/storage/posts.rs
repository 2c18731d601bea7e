use std::{collections::BTreeSet, io};

use serde::Serialize;

use super::{
    DataDir,
    layout::{list_id_files, read_optional},
};
use crate::{
    content::{Post, PostDraft, PostId, PostMeta, extract_title},
    error::{Error, Result},
};

/// 文章列表项，用于列表页与 `/api/user/post/list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    #[serde(rename = "slug")]
    pub id: PostId,
    pub title: String,
    pub tag: String,
    pub cdate: String,
}

/// 按文章 id 查询标题
///
/// 评论管理页面用它把评论和所属文章关联起来，查不到时返回 `None`。
pub trait PostTitles: Send + Sync {
    fn title(&self, id: PostId) -> impl std::future::Future<Output = Option<String>> + Send;
}

/// 基于 `posts/` 目录的文章仓储
#[derive(Debug, Clone)]
pub struct PostRepository {
    dir: DataDir,
}

impl PostRepository {
    pub fn new(dir: DataDir) -> Self {
        Self { dir }
    }

    /// 当前未删除的文章 id，从新到旧。
    pub async fn list_ids(&self) -> Result<Vec<PostId>> {
        let mut ids: Vec<PostId> = list_id_files(&self.dir.posts(), "mlmark")
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// 原始文件内容。
    pub async fn raw(&self, id: PostId) -> Result<Option<String>> {
        Ok(read_optional(&self.dir.post_file(id)).await?)
    }

    /// 读取文章，文件存在但缺少元信息块时返回空元信息与空正文。
    pub async fn get(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.raw(id).await?.map(|raw| {
            Post::parse(id, &raw).unwrap_or_else(|| Post {
                id,
                meta: PostMeta::default(),
                body: String::new(),
            })
        }))
    }

    /// 文章摘要列表，从新到旧。
    ///
    /// `limit` 先作用于 id 列表，缺少元信息块的文件随后被跳过。
    pub async fn summaries(&self, limit: Option<usize>) -> Result<Vec<PostSummary>> {
        let ids = self.list_ids().await?;
        let limit = limit.unwrap_or(ids.len());

        let mut summaries = Vec::new();
        for id in ids.into_iter().take(limit) {
            let Some(raw) = self.raw(id).await? else {
                continue;
            };
            let Some(post) = Post::parse(id, &raw) else {
                continue;
            };
            summaries.push(PostSummary {
                id,
                title: post.meta.title,
                tag: post.meta.tag,
                cdate: post.meta.cdate,
            });
        }
        Ok(summaries)
    }

    /// 新建文章，id 为现有最大 id + 1。
    ///
    /// 只扫描活动目录，回收站中的 id 不参与计算。
    pub async fn create(&self, draft: PostDraft) -> Result<PostId> {
        let id = self
            .list_ids()
            .await?
            .first()
            .map(|max| PostId(max.0 + 1))
            .unwrap_or(PostId(1));

        let today = today();
        let post = Post {
            id,
            meta: PostMeta {
                title: draft.title,
                tag: draft.tag,
                cdate: today.clone(),
                edate: today,
                extra: Vec::new(),
            },
            body: draft.body,
        };

        tokio::fs::write(self.dir.post_file(id), post.to_mlmark()).await?;
        tracing::info!(post_id = %id, "post created");
        Ok(id)
    }

    /// 编辑文章，保留创建日期并刷新编辑日期。
    pub async fn edit(&self, id: PostId, draft: PostDraft) -> Result<()> {
        let raw = self.raw(id).await?.ok_or(Error::NotFound)?;

        let today = today();
        let mut meta = Post::parse(id, &raw).map(|p| p.meta).unwrap_or_default();
        if meta.cdate.is_empty() {
            meta.cdate = today.clone();
        }
        meta.title = draft.title;
        meta.tag = draft.tag;
        meta.edate = today;

        let post = Post {
            id,
            meta,
            body: draft.body,
        };
        tokio::fs::write(self.dir.post_file(id), post.to_mlmark()).await?;
        tracing::info!(post_id = %id, "post edited");
        Ok(())
    }

    /// 删除文章：将文章及其评论文件移入回收站。
    pub async fn delete(&self, id: PostId) -> Result<()> {
        let file = self.dir.post_file(id);
        if !tokio::fs::try_exists(&file).await? {
            return Err(Error::NotFound);
        }

        tokio::fs::create_dir_all(self.dir.post_trash()).await?;
        tokio::fs::rename(&file, self.dir.post_trash().join(format!("{id}.mlmark"))).await?;

        let comments = self.dir.comment_file(id);
        match tokio::fs::metadata(&comments).await {
            Ok(_) => {
                tokio::fs::create_dir_all(self.dir.comment_trash()).await?;
                tokio::fs::rename(&comments, self.dir.comment_trash().join(format!("{id}.json")))
                    .await?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(post_id = %id, "post moved to trash");
        Ok(())
    }

    /// 所有文章的分类，去重并排序。
    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(categories_of(&self.summaries(None).await?))
    }
}

/// 从摘要列表中提取去重排序后的分类。
pub fn categories_of(summaries: &[PostSummary]) -> Vec<String> {
    summaries
        .iter()
        .filter(|s| !s.tag.is_empty())
        .map(|s| s.tag.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl PostTitles for PostRepository {
    async fn title(&self, id: PostId) -> Option<String> {
        match self.raw(id).await {
            Ok(Some(raw)) => extract_title(&raw)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(post_id = %id, error = %e, "failed to read post title");
                None
            }
        }
    }
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
