//! 用户资料

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 用户资料
///
/// 每个进程加载一次，之后只读，按引用共享给所有申请尝试。
/// 字段名与外部 `profile.json` 保持一致（camelCase）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// 简历文件路径
    #[serde(alias = "cvPath")]
    pub resume_path: String,
    pub headline: String,
    pub summary: String,
    /// 经历描述（给 LLM 作上下文）
    #[serde(alias = "experience")]
    pub experience_narrative: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(alias = "linkedInUrl", default)]
    pub profile_url: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn skills_line(&self) -> String {
        self.skills.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
