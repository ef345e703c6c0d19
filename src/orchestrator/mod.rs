//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的资源管理和职位调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量职位处理器
//! - 管理应用生命周期（初始化、运行）
//! - 持有浏览器资源（Browser、JsExecutor）
//! - 扫描职位列表（Vec<JobReference>）
//! - 逐个职位委托 `workflow::WizardDriver`
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<JobReference>)
//!     ↓
//! workflow::WizardDriver (处理单个 JobReference)
//!     ↓
//! services (能力层：matcher / filler / oracle / scanner / writer)
//!     ↓
//! infrastructure (基础设施：PageSurface / JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 Browser
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;

pub use batch_processor::App;
