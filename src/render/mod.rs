mod github;
pub mod html;
mod markdown;

pub use self::{github::GithubApiRenderer, markdown::MarkdownRenderer};

use crate::error::Result;

/// 将 Markdown 正文渲染为 HTML
pub trait Renderer: Send + Sync {
    fn render(&self, content: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// 运行时选定的正文渲染器
///
/// 配置了 GitHub token 时走 GitHub Markdown API，否则使用本地的 [`MarkdownRenderer`]。
#[derive(Clone)]
pub enum BodyRenderer {
    Github(GithubApiRenderer),
    Local(MarkdownRenderer),
}

impl BodyRenderer {
    pub fn from_token(token: Option<&str>) -> Result<Self> {
        Ok(match token {
            Some(token) => Self::Github(GithubApiRenderer::new(token)?),
            None => Self::Local(MarkdownRenderer),
        })
    }
}

impl Renderer for BodyRenderer {
    async fn render(&self, content: &str) -> Result<String> {
        match self {
            Self::Github(r) => r.render(content).await,
            Self::Local(r) => r.render(content).await,
        }
    }
}
