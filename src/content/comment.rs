use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    content::PostId,
    error::{Error, Result},
};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 存储在 `comments/<postId>.json` 中的一条评论。
///
/// 字段名与磁盘上的 JSON 保持一致（`parentId`）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
}

/// 访客提交的评论，尚未分配 id。
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<String>,
    pub name: String,
    pub email: String,
    pub text: String,
    pub date: String,
}

impl NewComment {
    /// 校验必填字段 `postId`、`name`、`text`、`date`。
    ///
    /// 空字符串视为缺失；`parentId` 为空字符串时视为顶层评论。
    pub fn new(
        post_id: Option<PostId>,
        name: Option<String>,
        email: Option<String>,
        text: Option<String>,
        date: Option<String>,
        parent_id: Option<String>,
    ) -> Result<Self> {
        fn required(v: Option<String>) -> Result<String> {
            v.filter(|s| !s.is_empty())
                .ok_or(Error::Validation("Required fields are missing."))
        }

        Ok(Self {
            post_id: post_id.ok_or(Error::Validation("Required fields are missing."))?,
            name: required(name)?,
            text: required(text)?,
            date: required(date)?,
            email: email.unwrap_or_default(),
            parent_id: parent_id.filter(|p| !p.is_empty()),
        })
    }

    /// 分配 id，生成可持久化的 [`Comment`]。
    pub fn into_comment(self, id: String) -> Comment {
        Comment {
            id,
            parent_id: self.parent_id,
            name: self.name,
            email: self.email,
            text: self.text,
            date: self.date,
        }
    }
}

/// 生成评论 id：毫秒时间戳的 36 进制 + 5 位随机 36 进制字符。
pub fn generate_comment_id(now_millis: u64) -> String {
    let mut id = to_base36(now_millis);
    let mut rng = rand::rng();
    for _ in 0..5 {
        id.push(BASE36[rng.random_range(0..BASE36.len())] as char);
    }
    id
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// 评论树中的一个节点，子节点保持存储顺序。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

/// 评论树的最大嵌套深度（根为 0）。
///
/// 更深的回复挂到深度为 `MAX_DEPTH - 1` 的祖先下，与其父评论并列显示。
pub const MAX_DEPTH: usize = 16;

/// 将扁平评论列表重建为森林。
///
/// 1. 先按 id 建立完整索引，因此父评论出现在子评论之后也能正确挂载
/// 2. `parentId` 为空、或指向不存在的评论时，该评论作为根节点（孤儿提升）
/// 3. 各层都保持原始存储顺序，不按日期排序
/// 4. 嵌套深度不超过 [`MAX_DEPTH`]
///
/// 重复 id 时以最后一条为挂载目标。自引用与环中的评论无法从任何根到达，
/// 这类评论同样提升为根，保证不丢失任何评论。
pub fn build_forest(comments: Vec<Comment>) -> Vec<CommentNode> {
    let index: HashMap<&str, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();

    for (i, c) in comments.iter().enumerate() {
        match c.parent_id.as_deref().and_then(|p| index.get(p)) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    // 环上的评论不可达，逐个提升为根后重新遍历
    let mut reachable = vec![false; comments.len()];
    mark_reachable(&roots, &children, &mut reachable);
    while let Some(i) = reachable.iter().position(|r| !r) {
        for list in children.iter_mut() {
            list.retain(|&c| c != i);
        }
        roots.push(i);
        mark_reachable(&[i], &children, &mut reachable);
    }
    roots.sort_unstable();

    let linked = cap_depth(&roots, &children);

    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    roots
        .iter()
        .map(|&i| assemble(i, &linked, &mut slots))
        .collect()
}

fn mark_reachable(from: &[usize], children: &[Vec<usize>], reachable: &mut [bool]) {
    let mut stack: Vec<usize> = from.to_vec();
    while let Some(i) = stack.pop() {
        if reachable[i] {
            continue;
        }
        reachable[i] = true;
        stack.extend(children[i].iter().copied());
    }
}

/// 重新计算挂载关系，超出 [`MAX_DEPTH`] 的节点改挂到深度为 `MAX_DEPTH - 1` 的祖先。
///
/// 输入必须是无环的森林。被改挂的节点与原有子节点一起按存储顺序排列。
fn cap_depth(roots: &[usize], children: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut linked: Vec<Vec<usize>> = vec![Vec::new(); children.len()];
    let mut parent: Vec<Option<usize>> = vec![None; children.len()];
    let mut depth = vec![0usize; children.len()];

    let mut stack = roots.to_vec();
    while let Some(i) = stack.pop() {
        let (anchor, child_depth) = match parent[i] {
            Some(p) if depth[i] >= MAX_DEPTH => (p, depth[i]),
            _ => (i, depth[i] + 1),
        };
        for &c in &children[i] {
            parent[c] = Some(anchor);
            depth[c] = child_depth;
            linked[anchor].push(c);
            stack.push(c);
        }
    }

    for list in linked.iter_mut() {
        list.sort_unstable();
    }
    linked
}

/// 递归深度受 [`MAX_DEPTH`] 限制。
fn assemble(i: usize, children: &[Vec<usize>], slots: &mut [Option<Comment>]) -> CommentNode {
    CommentNode {
        comment: slots[i].take().unwrap_or_default(),
        children: children[i]
            .iter()
            .map(|&c| assemble(c, children, slots))
            .collect(),
    }
}

/// 深度优先遍历森林，回调参数为节点与其深度（根为 0）。
pub fn walk<'a, F>(forest: &'a [CommentNode], f: &mut F)
where
    F: FnMut(&'a CommentNode, usize),
{
    let mut stack: Vec<(&'a CommentNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        f(node, depth);
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
}
