//! 职位与申请结果

use std::fmt;

use serde::{Deserialize, Serialize};

/// 一条职位引用
///
/// 由职位列表扫描产生，`id` 是去重键；每次运行只被申请流程消费一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
}

/// 申请的终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyStatus {
    /// 已提交
    Submitted,
    /// 页面上没有快速申请入口
    SkippedNoEntryPoint,
    /// 入口跳到了站外申请
    SkippedExternalRedirect,
    /// 点击 Next 后出现表单校验错误
    FailedValidation,
    /// 步数耗尽或页面状态无法识别
    FailedUnknownState,
}

impl ApplyStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ApplyStatus::Submitted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplyStatus::Submitted => "submitted",
            ApplyStatus::SkippedNoEntryPoint => "skippedNoEntryPoint",
            ApplyStatus::SkippedExternalRedirect => "skippedExternalRedirect",
            ApplyStatus::FailedValidation => "failedValidation",
            ApplyStatus::FailedUnknownState => "failedUnknownState",
        }
    }
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次申请尝试的结果，是返回给调用方的唯一信号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOutcome {
    pub job_id: String,
    pub status: ApplyStatus,
    /// 只有真正点击了提交按钮才为 true；弹窗无声关闭推断出的提交为 false
    pub confirmed: bool,
    /// 向导循环实际执行的步数
    pub steps: usize,
}

impl ApplicationOutcome {
    pub fn new(job_id: impl Into<String>, status: ApplyStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            confirmed: false,
            steps: 0,
        }
    }
}

/// 整次运行的汇总
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub skipped_no_entry_point: usize,
    pub skipped_external_redirect: usize,
    pub failed_validation: usize,
    pub failed_unknown_state: usize,
    /// 申请过程中抛出平台错误的职位
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: ApplyStatus) {
        match status {
            ApplyStatus::Submitted => self.submitted += 1,
            ApplyStatus::SkippedNoEntryPoint => self.skipped_no_entry_point += 1,
            ApplyStatus::SkippedExternalRedirect => self.skipped_external_redirect += 1,
            ApplyStatus::FailedValidation => self.failed_validation += 1,
            ApplyStatus::FailedUnknownState => self.failed_unknown_state += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.errored += 1;
    }

    pub fn total(&self) -> usize {
        self.submitted
            + self.skipped_no_entry_point
            + self.skipped_external_redirect
            + self.failed_validation
            + self.failed_unknown_state
            + self.errored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_camel_case() {
        let outcome = ApplicationOutcome::new("42", ApplyStatus::SkippedExternalRedirect);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["jobId"], "42");
        assert_eq!(json["status"], "skippedExternalRedirect");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(ApplyStatus::Submitted);
        summary.record(ApplyStatus::FailedValidation);
        summary.record_error();
        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.total(), 3);
    }
}
