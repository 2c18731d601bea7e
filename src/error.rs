use std::io;

use axum::{http::StatusCode, response::IntoResponse};

use crate::captcha::CaptchaError;

pub type Result<T> = core::result::Result<T, Error>;

/// 统一错误类型。
///
/// 所有错误都在请求处理边界转换为状态码，不会向客户端泄露内部细节：
///
/// - [`Error::Unauthorized`]：令牌缺失、错误或过期，三者不做区分
/// - [`Error::Validation`]：缺少必填字段，在任何写入之前拒绝
/// - [`Error::NotFound`]：文章或评论不存在
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(&'static str),

    #[error("Not Found")]
    NotFound,

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            Error::Validation(s) => (StatusCode::BAD_REQUEST, s).into_response(),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Error::Captcha(CaptchaError::Unavailable(e)) => {
                tracing::error!(error = %e, "hcaptcha verification error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hCaptcha verification error.",
                )
                    .into_response()
            }
            Error::Captcha(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            Error::Reqwest(e) => {
                tracing::error!(%e, "upstream request failed");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            Error::Config(e) => {
                tracing::error!(%e, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            Error::Json(e) => {
                tracing::error!(%e, "json encode error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            Error::Template(e) => {
                tracing::error!(%e, "template render error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
