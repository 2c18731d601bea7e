use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::content::PostId;

/// 数据目录布局
///
/// ```text
/// <root>/posts/<id>.mlmark
/// <root>/posts/trash/
/// <root>/comments/<id>.json
/// <root>/comments/trash/
/// ```
#[derive(Debug, Clone)]
pub struct DataDir {
    root: Arc<Path>,
}

impl DataDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Arc::from(root.as_ref()),
        }
    }

    /// 创建所有需要的目录，已存在时忽略。
    pub async fn bootstrap(&self) -> io::Result<()> {
        for dir in [self.post_trash(), self.comment_trash()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    pub fn posts(&self) -> PathBuf {
        self.root.join("posts")
    }

    pub fn post_trash(&self) -> PathBuf {
        self.posts().join("trash")
    }

    pub fn comments(&self) -> PathBuf {
        self.root.join("comments")
    }

    pub fn comment_trash(&self) -> PathBuf {
        self.comments().join("trash")
    }

    pub fn post_file(&self, id: PostId) -> PathBuf {
        self.posts().join(format!("{id}.mlmark"))
    }

    pub fn comment_file(&self, id: PostId) -> PathBuf {
        self.comments().join(format!("{id}.json"))
    }
}

/// 按扩展名列出目录中以文章 id 命名的文件，按文件名升序。
///
/// 目录不存在时返回空列表；文件名不是纯数字的条目被忽略。
pub(crate) async fn list_id_files(dir: &Path, ext: &str) -> io::Result<Vec<(PostId, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(ext)
        {
            continue;
        }
        let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<PostId>().ok())
        else {
            continue;
        };
        found.push((id, path));
    }

    found.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
    Ok(found)
}

/// 读取文件，不存在时返回 `None`。
pub(crate) async fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
