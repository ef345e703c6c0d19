//! 申请结果写入服务 - 业务能力层
//!
//! 只负责"追加一行到运行日志"能力，不关心流程

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppResult, FileError};
use crate::models::{ApplicationOutcome, JobReference};

/// 申请结果写入服务
///
/// 职责：
/// - 把每个职位的申请结果追加到日志文件
/// - 只处理单个职位
/// - 不关心流程顺序
pub struct OutcomeWriter {
    log_file_path: String,
}

impl OutcomeWriter {
    /// 写入 `OUTPUT_LOG_FILE` 指定的文件
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 追加一条结果
    pub async fn write(&self, job: &JobReference, outcome: &ApplicationOutcome) -> AppResult<()> {
        debug!("写入申请结果: {} -> {}", job.id, outcome.status);
        self.append(&format_line(job, outcome)).await
    }

    /// 追加一条平台错误
    pub async fn write_error(&self, job: &JobReference, reason: &str) -> AppResult<()> {
        let line = format!(
            "[{}] error | {} | {} @ {} | {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            job.id,
            job.title,
            job.company,
            reason
        );
        self.append(&line).await
    }

    async fn append(&self, line: &str) -> AppResult<()> {
        let write_failed = |source| FileError::WriteFailed {
            path: self.log_file_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .map_err(write_failed)?;
        file.write_all(line.as_bytes()).await.map_err(write_failed)?;
        Ok(())
    }
}

fn format_line(job: &JobReference, outcome: &ApplicationOutcome) -> String {
    let confirmation = if outcome.status.is_success() && !outcome.confirmed {
        " (unconfirmed)"
    } else {
        ""
    };
    format!(
        "[{}] {}{} | {} | {} @ {} | {} | steps={}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        outcome.status,
        confirmation,
        job.id,
        job.title,
        job.company,
        job.url,
        outcome.steps
    )
}
