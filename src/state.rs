use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::Authenticator,
    captcha::ChallengeVerifier,
    config::Config,
    error::Result,
    render::BodyRenderer,
    storage::{CommentStore, DataDir, PostRepository},
};

/// 应用程序上下文
///
/// [`AppState`] 封装了配置、文章仓储、评论存储、渲染器与令牌校验器，提供统一访问入口。
#[derive(Clone, FromRef)]
pub struct AppState {
    config: Arc<Config>,
    posts: PostRepository,
    comments: CommentStore,
    renderer: BodyRenderer,
    auth: Authenticator,
    captcha: ChallengeVerifier,
}

impl AppState {
    /// 根据配置创建一个新的 [`AppState`] 实例
    ///
    /// 数据目录尚不存在时会被创建。
    pub async fn new(config: Config) -> Result<Self> {
        let renderer = BodyRenderer::from_token(config.github_render_key.as_deref())?;
        let captcha = match &config.hcaptcha {
            Some(keys) => ChallengeVerifier::hcaptcha(&keys.secret_key),
            None => ChallengeVerifier::Disabled,
        };
        Self::with_parts(config, renderer, captcha).await
    }

    /// 使用指定的渲染器和人机验证创建实例
    pub async fn with_parts(
        config: Config,
        renderer: BodyRenderer,
        captcha: ChallengeVerifier,
    ) -> Result<Self> {
        let dir = DataDir::new(&config.data_dir);
        dir.bootstrap().await?;

        Ok(Self {
            posts: PostRepository::new(dir.clone()),
            comments: CommentStore::new(dir),
            auth: Authenticator::new(&config.admin_password),
            config: Arc::new(config),
            renderer,
            captcha,
        })
    }

    /// 获取配置
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 获取文章仓储
    pub fn posts(&self) -> &PostRepository {
        &self.posts
    }

    /// 获取评论存储
    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    /// 获取正文渲染器
    pub fn renderer(&self) -> &BodyRenderer {
        &self.renderer
    }

    /// 获取令牌校验器
    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    /// 获取人机验证器
    pub fn captcha(&self) -> &ChallengeVerifier {
        &self.captcha
    }
}
