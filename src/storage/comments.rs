use std::{io, path::Path, sync::Arc};

use serde::Serialize;
use tokio::sync::Mutex;

use super::{DataDir, PostTitles, layout::list_id_files};
use crate::{
    content::{Comment, CommentNode, NewComment, PostId, build_forest, generate_comment_id},
    error::{Error, Result},
};

const UNKNOWN_POST: &str = "Unknown Post";

/// 评论文件无法作为评论列表读取的原因
#[derive(Debug, thiserror::Error)]
pub enum Unreadable {
    #[error("comment record does not exist")]
    Missing,

    #[error("comment record unreadable: {0}")]
    Io(#[from] io::Error),

    #[error("comment record corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// 管理后台展示的评论，附带所属文章标题
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminComment {
    pub id: String,
    pub post_id: PostId,
    pub post_title: String,
    pub author: String,
    pub content: String,
    pub cdate: String,
}

/// 按文章分文件存储的评论
///
/// 每篇文章一个 JSON 数组，存储顺序即提交顺序。所有读-改-写都经过同一把写锁，
/// 避免同进程内并发提交互相覆盖。
#[derive(Debug, Clone)]
pub struct CommentStore {
    dir: DataDir,
    write_lock: Arc<Mutex<()>>,
}

impl CommentStore {
    pub fn new(dir: DataDir) -> Self {
        Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 读取文章的评论列表。
    pub async fn load(&self, post: PostId) -> std::result::Result<Vec<Comment>, Unreadable> {
        read_comments(&self.dir.comment_file(post)).await
    }

    /// 读取评论列表，任何读取失败都视为没有评论。
    ///
    /// 文件损坏时只记录日志；随后的写入会用新内容整体覆盖损坏的文件。
    pub async fn load_or_empty(&self, post: PostId) -> Vec<Comment> {
        match self.load(post).await {
            Ok(comments) => comments,
            Err(Unreadable::Missing) => Vec::new(),
            Err(e) => {
                tracing::warn!(post_id = %post, error = %e, "treating comment record as empty");
                Vec::new()
            }
        }
    }

    /// 重建文章的评论森林。
    pub async fn forest(&self, post: PostId) -> Vec<CommentNode> {
        build_forest(self.load_or_empty(post).await)
    }

    /// 追加一条评论，返回分配了 id 的评论。
    pub async fn append(&self, new: NewComment) -> Result<Comment> {
        let _guard = self.write_lock.lock().await;

        let post = new.post_id;
        let mut comments = self.load_or_empty(post).await;

        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        let comment = new.into_comment(generate_comment_id(millis));
        comments.push(comment.clone());

        self.save(post, &comments).await?;
        tracing::info!(post_id = %post, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// 按 id 查找评论，返回第一个匹配项及其所属文章。
    pub async fn find(&self, id: &str) -> Result<Option<(PostId, Comment)>> {
        for (post, path) in self.post_files().await? {
            let Ok(comments) = read_comments(&path).await else {
                continue;
            };
            if let Some(found) = comments.into_iter().find(|c| c.id == id) {
                return Ok(Some((post, found)));
            }
        }
        Ok(None)
    }

    /// 替换评论正文。
    pub async fn edit(&self, id: &str, text: &str) -> Result<PostId> {
        self.modify(id, |comments| {
            let target = comments.iter_mut().find(|c| c.id == id)?;
            target.text = text.to_string();
            Some(())
        })
        .await
    }

    /// 删除评论。
    ///
    /// 被删除评论的直接回复同时清空 `parentId`，提升为顶层评论。
    pub async fn delete(&self, id: &str) -> Result<PostId> {
        self.modify(id, |comments| {
            let before = comments.len();
            comments.retain(|c| c.id != id);
            if comments.len() == before {
                return None;
            }
            for c in comments.iter_mut() {
                if c.parent_id.as_deref() == Some(id) {
                    c.parent_id = None;
                }
            }
            Some(())
        })
        .await
    }

    /// 所有评论及其文章标题，按日期中的数字从新到旧排列。
    pub async fn admin_list(&self, titles: &impl PostTitles) -> Result<Vec<AdminComment>> {
        let mut all = Vec::new();

        for (post, path) in self.post_files().await? {
            let comments = match read_comments(&path).await {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::warn!(post_id = %post, error = %e, "skipping comment record");
                    continue;
                }
            };
            let post_title = titles
                .title(post)
                .await
                .unwrap_or_else(|| UNKNOWN_POST.to_string());

            all.extend(comments.into_iter().map(|c| AdminComment {
                id: c.id,
                post_id: post,
                post_title: post_title.clone(),
                author: c.name,
                content: c.text,
                cdate: c.date,
            }));
        }

        all.sort_by_key(|c| std::cmp::Reverse(date_key(&c.cdate)));
        Ok(all)
    }

    /// 最新的 `n` 条评论。
    pub async fn recent(&self, titles: &impl PostTitles, n: usize) -> Result<Vec<AdminComment>> {
        let mut all = self.admin_list(titles).await?;
        all.truncate(n);
        Ok(all)
    }

    /// 逐个扫描评论文件，对第一个包含目标评论的文件执行修改并写回。
    ///
    /// `f` 返回 `None` 表示该文件中没有目标评论。损坏的文件被跳过。
    async fn modify<F>(&self, id: &str, mut f: F) -> Result<PostId>
    where
        F: FnMut(&mut Vec<Comment>) -> Option<()>,
    {
        let _guard = self.write_lock.lock().await;

        for (post, path) in self.post_files().await? {
            let Ok(mut comments) = read_comments(&path).await else {
                continue;
            };
            if f(&mut comments).is_some() {
                self.save(post, &comments).await?;
                tracing::info!(post_id = %post, comment_id = %id, "comment record updated");
                return Ok(post);
            }
        }

        Err(Error::NotFound)
    }

    async fn post_files(&self) -> Result<Vec<(PostId, std::path::PathBuf)>> {
        Ok(list_id_files(&self.dir.comments(), "json").await?)
    }

    async fn save(&self, post: PostId, comments: &[Comment]) -> Result<()> {
        tokio::fs::create_dir_all(self.dir.comments()).await?;
        let json = serde_json::to_string_pretty(comments)?;
        tokio::fs::write(self.dir.comment_file(post), json).await?;
        Ok(())
    }
}

async fn read_comments(path: &Path) -> std::result::Result<Vec<Comment>, Unreadable> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Unreadable::Missing),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&text)?)
}

/// 日期字符串中所有数字拼接后的数值，无法解析时为 0。
fn date_key(date: &str) -> u128 {
    date.chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Titles;

    impl PostTitles for Titles {
        async fn title(&self, id: PostId) -> Option<String> {
            (id == PostId(1)).then(|| "First".to_string())
        }
    }

    async fn store() -> (tempfile::TempDir, CommentStore, DataDir) {
        let tmp = tempfile::tempdir().expect("创建临时目录失败");
        let dir = DataDir::new(tmp.path());
        dir.bootstrap().await.expect("创建目录失败");
        (tmp, CommentStore::new(dir.clone()), dir)
    }

    fn submission(post: u64, parent: Option<&str>, text: &str, date: &str) -> NewComment {
        NewComment::new(
            Some(PostId(post)),
            Some("alice".to_string()),
            None,
            Some(text.to_string()),
            Some(date.to_string()),
            parent.map(str::to_string),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_append_then_forest() {
        let (_tmp, store, _) = store().await;

        let a = store.append(submission(1, None, "A", "1")).await.unwrap();
        let b = store
            .append(submission(1, Some(a.id.as_str()), "B", "2"))
            .await
            .unwrap();
        let c = store.append(submission(1, None, "C", "3")).await.unwrap();
        let d = store
            .append(submission(1, Some(b.id.as_str()), "D", "4"))
            .await
            .unwrap();

        let forest = store.forest(PostId(1)).await;
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].comment.id, a.id);
        assert_eq!(forest[1].comment.id, c.id);
        assert_eq!(forest[0].children[0].comment.id, b.id);
        assert_eq!(forest[0].children[0].children[0].comment.id, d.id);

        assert!(store.forest(PostId(2)).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_empty() {
        let (_tmp, store, dir) = store().await;
        tokio::fs::write(dir.comment_file(PostId(1)), "{not json")
            .await
            .unwrap();

        assert!(matches!(
            store.load(PostId(1)).await,
            Err(Unreadable::Corrupt(_))
        ));
        assert!(store.forest(PostId(1)).await.is_empty());

        // 损坏的文件在下一次写入时被整体覆盖
        store.append(submission(1, None, "fresh", "1")).await.unwrap();
        let comments = store.load(PostId(1)).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "fresh");
    }

    #[tokio::test]
    async fn test_edit_is_idempotent() {
        let (_tmp, store, dir) = store().await;
        let a = store.append(submission(1, None, "A", "1")).await.unwrap();

        assert_eq!(store.edit(&a.id, "changed").await.unwrap(), PostId(1));
        let once = tokio::fs::read_to_string(dir.comment_file(PostId(1)))
            .await
            .unwrap();
        store.edit(&a.id, "changed").await.unwrap();
        let twice = tokio::fs::read_to_string(dir.comment_file(PostId(1)))
            .await
            .unwrap();

        assert_eq!(once, twice);
        let (post, found) = store.find(&a.id).await.unwrap().expect("评论应存在");
        assert_eq!(post, PostId(1));
        assert_eq!(found.text, "changed");
    }

    #[tokio::test]
    async fn test_edit_missing_is_not_found() {
        let (_tmp, store, _) = store().await;
        store.append(submission(1, None, "A", "1")).await.unwrap();
        assert!(matches!(
            store.edit("nope", "x").await,
            Err(Error::NotFound)
        ));
        assert!(matches!(store.delete("nope").await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_promotes_children() {
        let (_tmp, store, _) = store().await;
        let a = store.append(submission(1, None, "A", "1")).await.unwrap();
        let b = store
            .append(submission(1, Some(a.id.as_str()), "B", "2"))
            .await
            .unwrap();
        let c = store
            .append(submission(1, Some(b.id.as_str()), "C", "3"))
            .await
            .unwrap();

        store.delete(&a.id).await.unwrap();

        let forest = store.forest(PostId(1)).await;
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, b.id);
        assert_eq!(forest[0].comment.parent_id, None);
        assert_eq!(forest[0].children[0].comment.id, c.id);

        let stored = store.load(PostId(1)).await.unwrap();
        assert!(stored.iter().all(|x| x.id != a.id));
        assert!(stored.iter().all(|x| x.parent_id.as_deref() != Some(a.id.as_str())));
    }

    #[tokio::test]
    async fn test_scan_skips_corrupt_records() {
        let (_tmp, store, dir) = store().await;
        tokio::fs::write(dir.comment_file(PostId(1)), "garbage")
            .await
            .unwrap();
        let b = store.append(submission(2, None, "B", "1")).await.unwrap();

        store.edit(&b.id, "edited").await.unwrap();
        assert_eq!(store.find(&b.id).await.unwrap().unwrap().1.text, "edited");

        // 损坏文件未被改写
        let raw = tokio::fs::read_to_string(dir.comment_file(PostId(1)))
            .await
            .unwrap();
        assert_eq!(raw, "garbage");
    }

    #[tokio::test]
    async fn test_admin_list_and_recent() {
        let (_tmp, store, _) = store().await;
        store
            .append(submission(1, None, "old", "2024. 1. 2. 10:00:00"))
            .await
            .unwrap();
        store
            .append(submission(2, None, "new", "2024. 3. 4. 10:00:00"))
            .await
            .unwrap();
        store
            .append(submission(1, None, "mid", "2024. 2. 3. 10:00:00"))
            .await
            .unwrap();

        let all = store.admin_list(&Titles).await.unwrap();
        let contents: Vec<&str> = all.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["new", "mid", "old"]);
        assert_eq!(all[0].post_title, UNKNOWN_POST);
        assert_eq!(all[1].post_title, "First");
        assert_eq!(all[1].author, "alice");

        let recent = store.recent(&Titles, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "new");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let (_tmp, store, _) = store().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append(submission(1, None, &format!("c{i}"), "1"))
                        .await
                })
            })
            .collect();
        for h in handles {
            h.await.expect("任务失败").expect("写入失败");
        }

        assert_eq!(store.load(PostId(1)).await.unwrap().len(), 16);
    }

    #[test]
    fn test_date_key() {
        assert_eq!(date_key("2024-06-01"), 20240601);
        assert_eq!(date_key("no digits"), 0);
    }
}
