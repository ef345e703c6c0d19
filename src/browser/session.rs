//! 登录态恢复
//!
//! 读取 storage state 文件（`{cookies: [...], origins: [...]}`），
//! 在第一次导航前把 cookie 装进页面。文件只读，不会被回写或刷新。

use std::path::Path;

use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, BrowserError, FileError};

/// storage state 中的一条 cookie
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// 秒级时间戳，-1 表示会话 cookie
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

/// 登录态文件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl StorageState {
    pub async fn load(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(FileError::NotFound { path: display }.into());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(&display, e))?;
        Self::parse(&content, &display)
    }

    /// 解析登录态 JSON，顶层必须是对象
    pub fn parse(content: &str, origin: &str) -> AppResult<Self> {
        let parse_failed = |reason: String| -> AppError {
            FileError::ParseFailed {
                path: origin.to_string(),
                reason,
            }
            .into()
        };

        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| parse_failed(e.to_string()))?;
        if !value.is_object() {
            return Err(parse_failed("登录态顶层不是 JSON 对象".to_string()));
        }
        serde_json::from_value(value).map_err(|e| parse_failed(e.to_string()))
    }

    /// 转成 CDP 的 cookie 参数，无法转换的条目跳过
    pub fn cookie_params(&self) -> Vec<CookieParam> {
        self.cookies
            .iter()
            .filter_map(|cookie| match to_cookie_param(cookie) {
                Ok(param) => Some(param),
                Err(reason) => {
                    warn!("跳过无效 cookie {}: {}", cookie.name, reason);
                    None
                }
            })
            .collect()
    }
}

fn to_cookie_param(cookie: &StoredCookie) -> Result<CookieParam, String> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);

    if cookie.expires > 0.0 {
        builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
    }
    if let Some(same_site) = cookie.same_site.as_deref().and_then(parse_same_site) {
        builder = builder.same_site(same_site);
    }
    builder.build()
}

fn parse_same_site(value: &str) -> Option<CookieSameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" => Some(CookieSameSite::None),
        _ => None,
    }
}

/// 把登录态装进页面
pub async fn restore_session(page: &Page, auth_file: &Path) -> AppResult<usize> {
    let state = StorageState::load(auth_file).await?;
    let cookies = state.cookie_params();
    let count = cookies.len();
    debug!(
        "登录态文件包含 {} 个 cookie, {} 个 origin",
        state.cookies.len(),
        state.origins.len()
    );

    if count > 0 {
        page.set_cookies(cookies)
            .await
            .map_err(BrowserError::Cdp)?;
    }
    info!("✓ 已恢复登录态: {} 个 cookie", count);
    Ok(count)
}
