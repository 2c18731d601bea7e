use pulldown_cmark::{Event, Options, Parser, html};

use super::Renderer;
use crate::error::Result;

/// 本地 Markdown 渲染器，基于 pulldown-cmark
///
/// 开启表格、删除线与任务列表；段内换行输出为 `<br />`。
/// 正文中的原始 HTML 原样保留，文章只能由管理员写入。
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options
    }

    pub fn render_blocking(&self, content: &str) -> String {
        let parser = Parser::new_ext(content, Self::options()).map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            event => event,
        });

        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Renderer for MarkdownRenderer {
    async fn render(&self, content: &str) -> Result<String> {
        Ok(self.render_blocking(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_line_breaks() {
        let html = MarkdownRenderer.render_blocking("# Title\n\nline one\nline two");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>line one<br />\nline two</p>"));
    }

    #[test]
    fn test_list() {
        let html = MarkdownRenderer.render_blocking("- one\n- two\n");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>one</li>"));
        assert!(html.contains("<li>two</li>"));
    }

    #[test]
    fn test_link_and_emphasis() {
        let html = MarkdownRenderer.render_blocking("see [docs](https://docs.rs) *now*");
        assert!(html.contains(r#"<a href="https://docs.rs">docs</a>"#));
        assert!(html.contains("<em>now</em>"));
    }

    #[test]
    fn test_fenced_code_is_escaped() {
        let html = MarkdownRenderer.render_blocking("```rust\nlet a = 1 < 2;\n```\n");
        assert!(html.contains(r#"<pre><code class="language-rust">"#));
        assert!(html.contains("let a = 1 &lt; 2;"));
    }

    #[test]
    fn test_gfm_extensions() {
        let html = MarkdownRenderer.render_blocking("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains(r#"type="checkbox""#));
    }

    #[tokio::test]
    async fn test_render_trait() {
        let html = MarkdownRenderer.render("**bold**").await.unwrap();
        assert_eq!(html, "<p><strong>bold</strong></p>\n");
    }
}
