use serde::Deserialize;

const HCAPTCHA_VERIFY_API: &str = "https://api.hcaptcha.com/siteverify";

/// 人机验证失败原因
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// 已启用验证但请求未携带 token
    #[error("hCaptcha verification is required.")]
    Missing,

    /// 远端判定验证失败
    #[error("hCaptcha verification failed.")]
    Rejected,

    /// 无法访问验证服务
    #[error("hCaptcha verification error: {0}")]
    Unavailable(#[source] reqwest::Error),
}

#[derive(Deserialize)]
struct SiteVerify {
    success: bool,
}

/// 评论提交时的人机验证。
///
/// 未配置密钥时为 [`ChallengeVerifier::Disabled`]，验证被完全跳过。
#[derive(Clone)]
pub enum ChallengeVerifier {
    Disabled,
    HCaptcha {
        secret: String,
        client: reqwest::Client,
    },
}

impl ChallengeVerifier {
    pub fn hcaptcha(secret: impl Into<String>) -> Self {
        Self::HCaptcha {
            secret: secret.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::HCaptcha { .. })
    }

    pub async fn verify(&self, token: Option<&str>) -> Result<(), CaptchaError> {
        let (secret, client) = match self {
            Self::Disabled => return Ok(()),
            Self::HCaptcha { secret, client } => (secret, client),
        };

        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(CaptchaError::Missing)?;

        let reply = client
            .post(HCAPTCHA_VERIFY_API)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(CaptchaError::Unavailable)?
            .json::<SiteVerify>()
            .await
            .map_err(CaptchaError::Unavailable)?;

        if reply.success {
            Ok(())
        } else {
            Err(CaptchaError::Rejected)
        }
    }
}
