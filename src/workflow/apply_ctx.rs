//! 申请上下文
//!
//! 封装"我正在处理第几个职位、哪个职位"这一信息

use std::fmt::Display;

use crate::models::JobReference;
use crate::utils::truncate_text;

/// 申请上下文
#[derive(Debug, Clone)]
pub struct ApplyCtx {
    /// 职位ID
    pub job_id: String,

    /// 职位在本次运行中的序号（从1开始，仅用于日志显示）
    pub job_index: usize,

    /// 本次运行的职位总数
    pub job_total: usize,

    /// 职位标题
    pub title: String,
}

impl ApplyCtx {
    pub fn new(job: &JobReference, job_index: usize, job_total: usize) -> Self {
        Self {
            job_id: job.id.clone(),
            job_index,
            job_total,
            title: job.title.clone(),
        }
    }
}

impl Display for ApplyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[职位 {}/{} ID#{} {}]",
            self.job_index,
            self.job_total,
            self.job_id,
            truncate_text(&self.title, 30)
        )
    }
}
