use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha512};
use subtle::{Choice, ConstantTimeEq};

use crate::error::{Error, Result};

/// 服务端接受的时钟偏差（秒），窗口为 `[now - 5, now + 5]`。
pub const WINDOW_SECS: i64 = 5;

/// 计算 `secret` 与时间戳拼接后的 SHA-512，小写十六进制。
pub fn digest(secret: &str, timestamp: i64) -> String {
    let mut hasher = Sha512::new();
    hasher.update(secret.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// 当前 Unix 时间（秒）。
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// 管理后台登录时生成的一对令牌。
///
/// 第一个基于 `now - 1`，用于立即验证；第二个基于 `now`，缓存给后续请求使用。
pub fn bootstrap(secret: &str, now: i64) -> (String, String) {
    (digest(secret, now - 1), digest(secret, now))
}

/// 基于时间窗口的令牌校验器
///
/// 服务端从不保存令牌，只持有管理员密码，对窗口内每一秒重新计算候选值并比较。
#[derive(Clone)]
pub struct Authenticator {
    password: Arc<str>,
}

impl Authenticator {
    pub fn new(password: impl AsRef<str>) -> Self {
        Self {
            password: Arc::from(password.as_ref()),
        }
    }

    /// 以给定时间为基准校验令牌。
    ///
    /// 窗口内每一秒都会计算并以常量时间比较，耗时与命中的偏移无关。
    pub fn verify_at(&self, proof: &str, now: i64) -> bool {
        let mut matched = Choice::from(0);
        for t in now - WINDOW_SECS..=now + WINDOW_SECS {
            matched |= digest(&self.password, t).as_bytes().ct_eq(proof.as_bytes());
        }
        matched.into()
    }

    /// 以当前时间为基准校验令牌。
    pub fn verify(&self, proof: &str) -> bool {
        self.verify_at(proof, unix_now())
    }

    /// 校验请求体中的 `token` 字段。
    ///
    /// 字段缺失或不是字符串时直接拒绝，不计算任何哈希。
    pub fn check(&self, token: Option<&Value>) -> Result<()> {
        match token.and_then(Value::as_str) {
            Some(proof) if self.verify(proof) => Ok(()),
            _ => {
                tracing::debug!("admin token rejected");
                Err(Error::Unauthorized)
            }
        }
    }
}
