//! 批量职位处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次运行的资源管理和职位调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、加载用户资料、连接或启动浏览器、恢复登录态
//! 2. **职位扫描**：打开搜索页，交给 `ListingScanner` 提取职位列表
//! 3. **顺序申请**：逐个职位交给 `WizardDriver`，职位之间随机停顿
//! 4. **结果记录**：每个结果追加到运行日志，最后输出统计
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **严格顺序**：所有职位共用一个登录会话和一个页面，不做并发
//! - **单职位失败不影响整体**：申请过程中的错误计入统计后继续

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::FileError;
use crate::infrastructure::{JsExecutor, PageSurface};
use crate::models::{load_profile, JobReference, RunSummary, UserProfile};
use crate::services::{AnswerOracle, ListingScanner, LlmService, OutcomeWriter, ProfileOracle};
use crate::utils::logging::{
    init_log_file, log_job_start, log_jobs_loaded, log_startup, print_final_stats,
};
use crate::workflow::{ApplyCtx, WizardDriver};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    page: Arc<dyn PageSurface>,
    driver: WizardDriver,
    writer: OutcomeWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        let search_url = config.search_url()?;
        log_startup(&search_url, config.scan.max_jobs, config.wizard.max_steps);

        // 加载用户资料（运行期间只读）
        let profile: Arc<UserProfile> = Arc::new(
            load_profile(Path::new(&config.profile_path))
                .await
                .with_context(|| format!("无法加载用户资料: {}", config.profile_path))?,
        );
        info!("👤 用户资料: {} ({})", profile.full_name(), profile.headline);

        let auth_file = Path::new(&config.auth_file_path);
        if !tokio::fs::try_exists(auth_file).await.unwrap_or(false) {
            return Err(FileError::NotFound {
                path: config.auth_file_path.clone(),
            })
            .context("缺少登录态文件，请先完成登录并导出 storage state");
        }

        // 连接已启动的浏览器，或自行启动
        let (browser, page) = match config.browser_debug_port {
            Some(port) => browser::connect_to_browser_and_page(port, None).await?,
            None => {
                browser::launch_browser(config.headless, config.chrome_executable.as_deref())
                    .await?
            }
        };
        browser::restore_session(&page, auth_file).await?;

        // 创建 JsExecutor（持有 page）
        let page: Arc<dyn PageSurface> = Arc::new(JsExecutor::new(page));

        let oracle: Arc<dyn AnswerOracle> = Arc::new(ProfileOracle::new(
            LlmService::new(&config),
            profile.clone(),
            config.fallback.clone(),
        ));
        let driver = WizardDriver::new(
            page.clone(),
            oracle,
            profile,
            config.fallback.clone(),
            config.wizard.clone(),
        );

        Ok(Self {
            writer: OutcomeWriter::with_path(config.output_log_file.clone()),
            config,
            _browser: browser,
            page,
            driver,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        let jobs = self.load_jobs().await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到可申请的职位，程序结束");
            return Ok(RunSummary::default());
        }

        log_jobs_loaded(jobs.len());

        let summary = self.process_all_jobs(&jobs).await;

        print_final_stats(&summary, &self.config.output_log_file);

        Ok(summary)
    }

    /// 打开搜索页并扫描职位
    async fn load_jobs(&self) -> Result<Vec<JobReference>> {
        let search_url = self.config.search_url()?;
        info!("\n🔍 正在打开搜索页...");
        self.page.goto(&search_url).await?;

        let scanner = ListingScanner::new(self.page.as_ref(), self.config.scan.clone());
        let jobs = scanner
            .scan(self.config.wizard.page_settle, self.config.wizard.poll_interval)
            .await?;
        Ok(jobs)
    }

    /// 逐个职位申请
    async fn process_all_jobs(&self, jobs: &[JobReference]) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = jobs.len();

        for (idx, job) in jobs.iter().enumerate() {
            let ctx = ApplyCtx::new(job, idx + 1, total);
            log_job_start(idx + 1, total, &job.title);

            match self.driver.apply(job, &ctx).await {
                Ok(outcome) => {
                    summary.record(outcome.status);
                    if let Err(e) = self.writer.write(job, &outcome).await {
                        warn!("{} ⚠️ 写入结果失败: {}", ctx, e);
                    }
                }
                Err(e) => {
                    error!("{} ❌ 申请过程中发生错误: {}", ctx, e);
                    summary.record_error();
                    if let Err(e) = self.writer.write_error(job, &e.to_string()).await {
                        warn!("{} ⚠️ 写入结果失败: {}", ctx, e);
                    }
                }
            }

            if idx + 1 < total {
                self.pause_between_jobs().await;
            }
        }

        summary
    }

    async fn pause_between_jobs(&self) {
        let millis = rand::thread_rng().gen_range(self.config.pacing.between_jobs_ms.clone());
        info!("⏳ 停顿 {:.1} 秒后处理下一个职位", millis as f64 / 1000.0);
        sleep(Duration::from_millis(millis)).await;
    }
}
