use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult, FileError};
use crate::models::profile::UserProfile;

/// 从文件加载用户资料
///
/// 扩展名为 `.toml` 时按 TOML 解析，其余按 JSON 解析。
pub async fn load_profile(path: &Path) -> AppResult<UserProfile> {
    let display = path.display().to_string();
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path: display }.into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let profile = parse_profile(&content, path)?;
    tracing::info!(
        "✓ 已加载用户资料: {} ({} 项技能)",
        profile.full_name(),
        profile.skills.len()
    );
    Ok(profile)
}

fn parse_profile(content: &str, path: &Path) -> AppResult<UserProfile> {
    let is_toml = path.extension().and_then(|s| s.to_str()) == Some("toml");
    let parsed = if is_toml {
        toml::from_str::<UserProfile>(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<UserProfile>(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| {
        FileError::ParseFailed {
            path: path.display().to_string(),
            reason,
        }
        .into()
    })
}
