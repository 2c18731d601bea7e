use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;

use super::Renderer;
use crate::error::{Error, Result};

const GITHUB_MARKDOWN_RENDER_API: &str = "https://api.github.com/markdown";

/// GithubApiRenderer 用于将 Markdown 文本渲染为 HTML。
///
/// 它使用 GitHub Markdown API，可以渲染 GitHub Flavored Markdown。
#[derive(Clone)]
pub struct GithubApiRenderer {
    client: reqwest::Client,
}

impl GithubApiRenderer {
    /// 使用指定的 GitHub Token 创建渲染器
    ///
    /// ```ignore
    /// let renderer = GithubApiRenderer::new("your_token")?;
    /// ```
    pub fn new<T: AsRef<str>>(token: T) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
                .map_err(|e| Error::Config(format!("GITHUB_MARKDOWN_RENDER_KEY: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    text: &'a str,
    mode: &'a str,
}

impl Renderer for GithubApiRenderer {
    /// 将 Markdown 文本渲染为 HTML
    async fn render(&self, content: &str) -> Result<String> {
        let resp = self
            .client
            .post(GITHUB_MARKDOWN_RENDER_API)
            .json(&RequestBody {
                text: content,
                mode: "gfm",
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}
