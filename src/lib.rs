//! # Quick Apply
//!
//! 自动完成招聘网站"快速申请"向导的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageSurface` - 页面操作能力（查询、点击、填写、上传）
//! - `JsExecutor` - 唯一的 page owner，基于 chromiumoxide 实现 `PageSurface`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个字段 / 单个职位
//! - `Matchers` - 多策略元素匹配（入口、Submit、Review、Next）
//! - `FieldFiller` - 表单字段分类与填写
//! - `ProfileOracle` / `LlmService` - 基于用户资料的问答能力
//! - `ListingScanner` - 搜索结果页职位扫描
//! - `OutcomeWriter` - 写运行日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整申请流程
//! - `ApplyCtx` - 上下文封装（职位序号 + 职位 ID）
//! - `wizard_state` - 纯函数状态机（状态 + 事件 → 下一状态 + 副作用）
//! - `WizardDriver` - 执行副作用，驱动状态机直到终止
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 管理浏览器资源，顺序处理职位列表
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, PageSurface};
pub use models::{ApplicationOutcome, ApplyStatus, JobReference, UserProfile};
pub use orchestrator::App;
pub use workflow::{ApplyCtx, WizardDriver};
