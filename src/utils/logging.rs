/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::RunSummary;

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。
/// 重复调用是无害的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n职位申请日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(search_url: &str, max_jobs: usize, max_steps: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 快速申请模式（逐个职位顺序处理）");
    info!("🔗 搜索地址: {}", search_url);
    info!("📊 最多处理职位: {} | 每个向导最多 {} 步", max_jobs, max_steps);
    info!("{}", "=".repeat(60));
}

/// 记录职位列表扫描结果
pub fn log_jobs_loaded(total: usize) {
    info!("✓ 找到 {} 个待申请的职位", total);
    info!("💡 每个职位之间会随机停顿，避免触发风控\n");
}

/// 记录单个职位开始
///
/// # 参数
/// - `index`: 职位编号（从 1 开始）
/// - `total`: 职位总数
/// - `title`: 职位标题
pub fn log_job_start(index: usize, total: usize, title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 职位 {}/{}: {}", index, total, truncate_text(title, 60));
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交: {}/{}", summary.submitted, summary.total());
    info!("⏭️ 无入口跳过: {}", summary.skipped_no_entry_point);
    info!("↪️ 外部申请跳过: {}", summary.skipped_external_redirect);
    info!("⚠️ 校验失败: {}", summary.failed_validation);
    info!("❓ 未知状态: {}", summary.failed_unknown_state);
    info!("❌ 运行错误: {}", summary.errored);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("années d'expérience", 6), "années...");
    }
}
