use std::{net::SocketAddr, path::PathBuf};

use crate::error::{Error, Result};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PASSWORD: &str = "PASSWORD";
const SITE_KEY_PLACEHOLDER: &str = "YOUR_SITE_KEY_(LEAVE_BLANK_IF_NOT_USED)";
const SECRET_KEY_PLACEHOLDER: &str = "YOUR_SECRET_KEY_(LEAVE_BLANK_IF_NOT_USED)";

/// 进程级配置，启动时构建一次，之后只读。
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub admin_password: String,
    pub site: SiteMeta,
    pub hcaptcha: Option<HCaptchaKeys>,
    pub github_render_key: Option<String>,
}

/// 页面展示用的站点信息与界面文案
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub blog_name: String,
    pub user_name: String,
    pub blog_url: String,
    pub user_url: String,
    pub lang: String,
    pub all_categories: String,
    pub category: String,
    pub date: String,
    pub comment_title: String,
}

#[derive(Debug, Clone)]
pub struct HCaptchaKeys {
    pub site_key: String,
    pub secret_key: String,
}

impl Config {
    /// 从 `.env` 与进程环境变量读取配置。
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，未设置的键使用默认值。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let addr = or("MYLOGS_ADDR", DEFAULT_ADDR)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("MYLOGS_ADDR: {e}")))?;

        let admin_password = match lookup("ADMIN_PASSWORD") {
            Some(p) if !p.is_empty() => p,
            _ => {
                tracing::warn!("ADMIN_PASSWORD not set, falling back to the default password");
                DEFAULT_PASSWORD.to_string()
            }
        };

        let hcaptcha = match (lookup("HCAPTCHA_SITE_KEY"), lookup("HCAPTCHA_SECRET_KEY")) {
            (Some(site_key), Some(secret_key))
                if is_real_key(&site_key, SITE_KEY_PLACEHOLDER)
                    && is_real_key(&secret_key, SECRET_KEY_PLACEHOLDER) =>
            {
                Some(HCaptchaKeys {
                    site_key,
                    secret_key,
                })
            }
            _ => None,
        };

        Ok(Self {
            addr,
            data_dir: PathBuf::from(or("MYLOGS_DATA_DIR", ".")),
            admin_password,
            site: SiteMeta {
                blog_name: or("ML_BLOG_NAME", "MyLogs"),
                user_name: or("ML_USER_NAME", "User"),
                blog_url: or("ML_BLOG_URL", "https://example.com"),
                user_url: or("ML_USER_URL", "https://example.com"),
                lang: or("ML_TRANS_LANG", "en"),
                all_categories: or("ML_TRANS_ALLCATEGORIES", "All Categories"),
                category: or("ML_TRANS_CATEGORY", "Category"),
                date: or("ML_TRANS_DATE", "Date"),
                comment_title: or("ML_TRANS_COMMENT_TITLE", "Comments"),
            },
            hcaptcha,
            github_render_key: lookup("GITHUB_MARKDOWN_RENDER_KEY").filter(|k| !k.trim().is_empty()),
        })
    }
}

fn is_real_key(key: &str, placeholder: &str) -> bool {
    !key.trim().is_empty() && key != placeholder
}
