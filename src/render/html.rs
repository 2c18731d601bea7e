//! 页面拼装。页面由 `templates/` 下的 askama 模板渲染，模板变量默认转义。

use askama::Template;

use crate::{
    config::SiteMeta,
    content::{CommentNode, Post, PostId, walk},
    error::Result,
    storage::PostSummary,
};

/// 每层回复的缩进（px）
const INDENT_PX: usize = 28;

const UNTITLED: &str = "(untitled)";

#[derive(Template)]
#[template(path = "comments.html")]
struct CommentsTemplate<'a> {
    title: &'a str,
    rows: Vec<CommentRow<'a>>,
}

/// 评论区中的一行，按深度缩进
struct CommentRow<'a> {
    id: &'a str,
    name: &'a str,
    date: &'a str,
    text_html: String,
    depth: usize,
    indent: usize,
}

#[derive(Template)]
#[template(path = "list.html")]
struct ListTemplate<'a> {
    site: &'a SiteMeta,
    options: Vec<CategoryOption<'a>>,
    cards: Vec<PostCard<'a>>,
}

struct CategoryOption<'a> {
    tag: &'a str,
    selected: bool,
}

struct PostCard<'a> {
    id: PostId,
    title: &'a str,
    tag: &'a str,
    cdate: &'a str,
}

#[derive(Template)]
#[template(path = "post.html")]
struct PostTemplate<'a> {
    site: &'a SiteMeta,
    post: &'a Post,
    title: &'a str,
    body_html: &'a str,
    comments: String,
    hcaptcha_site_key: Option<&'a str>,
}

/// 评论正文：转义后保留换行。
fn comment_text(text: &str) -> String {
    html_escape::encode_safe(text)
        .lines()
        .collect::<Vec<_>>()
        .join("<br>")
}

/// 评论区 HTML 片段，深度优先输出，回复按深度缩进。
pub fn comments(forest: &[CommentNode], title: &str) -> Result<String> {
    let mut rows = Vec::new();
    walk(forest, &mut |node, depth| {
        let c = &node.comment;
        rows.push(CommentRow {
            id: &c.id,
            name: if c.name.is_empty() { "Anonymous" } else { &c.name },
            date: &c.date,
            text_html: comment_text(&c.text),
            depth,
            indent: depth * INDENT_PX,
        });
    });
    Ok(CommentsTemplate { title, rows }.render()?)
}

/// 列表页：分类下拉框 + 文章卡片。
pub fn list_page(
    site: &SiteMeta,
    posts: &[PostSummary],
    categories: &[String],
    selected: Option<&str>,
) -> Result<String> {
    let options = categories
        .iter()
        .map(|tag| CategoryOption {
            tag,
            selected: selected == Some(tag.as_str()),
        })
        .collect();
    let cards = posts
        .iter()
        .map(|p| PostCard {
            id: p.id,
            title: if p.title.is_empty() { UNTITLED } else { &p.title },
            tag: &p.tag,
            cdate: &p.cdate,
        })
        .collect();

    Ok(ListTemplate {
        site,
        options,
        cards,
    }
    .render()?)
}

/// 文章页：已渲染的正文 + 评论区 + 评论表单。
pub fn post_page(
    site: &SiteMeta,
    post: &Post,
    body_html: &str,
    forest: &[CommentNode],
    hcaptcha_site_key: Option<&str>,
) -> Result<String> {
    let title = if post.meta.title.is_empty() {
        UNTITLED
    } else {
        &post.meta.title
    };

    Ok(PostTemplate {
        site,
        post,
        title,
        body_html,
        comments: comments(forest, &site.comment_title)?,
        hcaptcha_site_key,
    }
    .render()?)
}
