use std::ops::RangeInclusive;
use std::time::Duration;

use url::Url;

use crate::error::{AppResult, ConfigError};

/// 职位搜索页基础地址
pub const SEARCH_BASE_URL: &str = "https://www.linkedin.com/jobs/search/";

/// 站点根地址，用于补全相对链接
pub const SITE_ORIGIN: &str = "https://www.linkedin.com";

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 已启动浏览器的调试端口（设置后直接连接，不再启动新浏览器）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径（为空时由 chromiumoxide 自动查找）
    pub chrome_executable: Option<String>,
    /// 登录态文件（storage state JSON）
    pub auth_file_path: String,
    /// 用户资料文件（JSON 或 TOML）
    pub profile_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 搜索配置 ---
    pub search_keywords: String,
    pub search_location: String,
    /// 只看远程职位
    pub job_remote: bool,
    // --- 策略 ---
    pub wizard: WizardPolicy,
    pub fallback: FallbackPolicy,
    pub scan: ScanPolicy,
    pub pacing: PacingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: false,
            browser_debug_port: None,
            chrome_executable: None,
            auth_file_path: "user-data/auth.json".to_string(),
            profile_path: "user-data/profile.json".to_string(),
            verbose_logging: false,
            output_log_file: "applications.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
            search_keywords: "Software Engineer".to_string(),
            search_location: "Remote".to_string(),
            job_remote: false,
            wizard: WizardPolicy::default(),
            fallback: FallbackPolicy::default(),
            scan: ScanPolicy::default(),
            pacing: PacingPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(default.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            auth_file_path: std::env::var("AUTH_FILE_PATH").unwrap_or(default.auth_file_path),
            profile_path: std::env::var("PROFILE_PATH").unwrap_or(default.profile_path),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            search_keywords: std::env::var("SEARCH_KEYWORDS").unwrap_or(default.search_keywords),
            search_location: std::env::var("SEARCH_LOCATION").unwrap_or(default.search_location),
            job_remote: env_parse("JOB_REMOTE").unwrap_or(default.job_remote),
            wizard: WizardPolicy {
                max_steps: env_parse("MAX_WIZARD_STEPS").unwrap_or(default.wizard.max_steps),
                ..default.wizard
            },
            fallback: default.fallback,
            scan: ScanPolicy {
                max_jobs: env_parse("MAX_JOBS").unwrap_or(default.scan.max_jobs),
                ..default.scan
            },
            pacing: default.pacing,
        }
    }

    /// 构造职位搜索地址
    ///
    /// `f_AL=true` 只保留支持快速申请的职位，`JOB_REMOTE` 打开时追加 `f_WT=2`。
    pub fn search_url(&self) -> AppResult<String> {
        let mut params = vec![
            ("f_AL", "true"),
            ("keywords", self.search_keywords.as_str()),
            ("location", self.search_location.as_str()),
        ];
        if self.job_remote {
            params.push(("f_WT", "2"));
        }
        let url = Url::parse_with_params(SEARCH_BASE_URL, &params).map_err(ConfigError::from)?;
        Ok(url.to_string())
    }
}

/// 读取并解析环境变量，失败时返回 None（由调用方回落到默认值）
fn env_parse<T: std::str::FromStr>(var_name: &str) -> Option<T> {
    let value = std::env::var(var_name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            let err = ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            };
            tracing::warn!("{}，使用默认值", err);
            None
        }
    }
}

/// 申请向导的节奏与上限
#[derive(Clone, Debug)]
pub struct WizardPolicy {
    /// 向导循环的最大步数，保证对异常页面也能终止
    pub max_steps: usize,
    /// 点击申请按钮后等待弹窗出现的上限
    pub modal_timeout: Duration,
    /// 打开职位页后的等待
    pub page_settle: Duration,
    /// 每一步开始前的稳定等待
    pub step_settle: Duration,
    /// 点击 Review 后等待汇总页渲染
    pub review_settle: Duration,
    /// 点击 Next 后等待校验结果
    pub next_settle: Duration,
    /// 点击 Submit 后等待确认
    pub confirmation_wait: Duration,
    /// 轮询元素的间隔
    pub poll_interval: Duration,
    /// 弹窗无声关闭时是否视为已提交
    pub trust_silent_modal_close: bool,
}

impl Default for WizardPolicy {
    fn default() -> Self {
        Self {
            max_steps: 15,
            modal_timeout: Duration::from_secs(5),
            page_settle: Duration::from_secs(3),
            step_settle: Duration::from_secs(1),
            review_settle: Duration::from_secs(2),
            next_settle: Duration::from_secs(1),
            confirmation_wait: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
            trust_silent_modal_close: true,
        }
    }
}

impl WizardPolicy {
    /// 所有等待归零的策略（合成页面测试用）
    pub fn without_waits(self) -> Self {
        Self {
            modal_timeout: Duration::ZERO,
            page_settle: Duration::ZERO,
            step_settle: Duration::ZERO,
            review_settle: Duration::ZERO,
            next_settle: Duration::ZERO,
            confirmation_wait: Duration::ZERO,
            poll_interval: Duration::ZERO,
            ..self
        }
    }
}

/// 兜底答案的业务取值
#[derive(Clone, Debug)]
pub struct FallbackPolicy {
    /// 工作年限字段被预填为 0 且 LLM 给不出正整数时使用的随机范围
    pub experience_years: RangeInclusive<u32>,
    /// 薪资期望范围（写入提示词）
    pub salary: RangeInclusive<u32>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            experience_years: 3..=6,
            salary: 55_000..=65_000,
        }
    }
}

/// 职位列表扫描策略
#[derive(Clone, Debug)]
pub struct ScanPolicy {
    /// 单次运行最多处理的职位数
    pub max_jobs: usize,
    /// 链接文本短于该长度时改读内部标题元素
    pub min_title_len: usize,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            max_jobs: 25,
            min_title_len: 3,
        }
    }
}

/// 两次申请之间的随机停顿
#[derive(Clone, Debug)]
pub struct PacingPolicy {
    pub between_jobs_ms: RangeInclusive<u64>,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            between_jobs_ms: 5_000..=10_000,
        }
    }
}
