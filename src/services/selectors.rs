//! 页面选择器常量
//!
//! 目标站点的 DOM 会随版本和语言变化，所有选择器集中在这里维护。

/// 申请弹窗（等待出现时使用）
pub const MODAL_APPEAR: &str = ".jobs-easy-apply-content, .artdeco-modal";
/// 申请弹窗（循环内判断是否仍存在）
pub const MODAL: &str = ".artdeco-modal";

/// 会挡住申请按钮的悬浮层：顶部导航、聊天窗、搜索结果头、登录层
pub const OVERLAYS: &[&str] = &[
    ".global-nav",
    ".msg-overlay-list-bubble",
    ".jobs-search-results-list__header",
    ".authentication-outlet",
];

/// 文本 / 数字输入
pub const TEXT_INPUTS: &str =
    r#"input[type="text"], input[type="email"], input[type="tel"], input[type="number"], textarea"#;
pub const FIELDSET: &str = "fieldset";
pub const LEGEND: &str = "legend";
/// 单选组的可见问题文本
pub const FIELDSET_HINT: &str = r#"span[aria-hidden="true"]"#;
pub const RADIO: &str = r#"input[type="radio"]"#;
pub const SELECT: &str = "select";
pub const FILE_INPUT: &str = r#"input[type="file"]"#;
pub const CHECKBOX: &str = r#"input[type="checkbox"]"#;

/// 表单内联校验错误
pub const INLINE_ERROR: &str = ".artdeco-inline-feedback--error";

/// 弹窗底部的主按钮
pub const PRIMARY_FOOTER_BUTTON: &str = ".artdeco-modal__actionbar button.artdeco-button--primary";

/// 职位链接
pub const JOB_LINKS: &str = r#"a[href*="/jobs/view/"], a[href*="currentJobId"]"#;
/// 链接内部的标题元素
pub const JOB_CARD_TITLE: &str = ".job-card-list__title";
/// 职位卡片容器
pub const JOB_CARD: &str = "li, .job-card-container";
pub const JOB_CARD_COMPANY: &str =
    ".job-card-container__primary-description, .artdeco-entity-lockup__subtitle";
pub const JOB_CARD_LOCATION: &str =
    ".job-card-container__metadata-item, .artdeco-entity-lockup__caption";

/// 搜索结果页的几种已知布局
pub const RESULT_LAYOUTS: &[(&str, &str)] = &[
    ("search-results", ".jobs-search-results-list"),
    ("scaffold", ".scaffold-layout__list-container"),
    ("basic-list", "ul.jobs-search__results-list"),
    ("feed-updates", ".feed-shared-update-v2"),
];

/// `label[for="<id>"]`
pub fn label_for(id: &str) -> String {
    format!(r#"label[for="{}"]"#, id.replace('"', "\\\""))
}
