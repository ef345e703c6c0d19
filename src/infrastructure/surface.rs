//! 页面操作能力 - 基础设施层
//!
//! 上层（services / workflow）只通过 [`PageSurface`] 接触页面，
//! 不直接持有 chromiumoxide 的 Page。这样申请向导既能跑在真实浏览器上，
//! 也能跑在测试用的合成 DOM 上。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::error::AppResult;

/// 页面元素句柄
///
/// 不透明的引用，只能交回给产生它的 [`PageSurface`] 使用。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 浏览器自动化能力
///
/// 元素已被移除时，针对元素的操作返回 `BrowserError::ElementDetached`。
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// 导航到指定地址
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// 当前页面标题
    async fn title(&self) -> AppResult<String>;

    /// 按 CSS 选择器查找元素；`scope` 为 None 时在整个文档中查找
    async fn query(&self, scope: Option<&ElementRef>, selector: &str) -> AppResult<Vec<ElementRef>>;

    /// 向上查找最近的匹配祖先（包含自身）
    async fn closest(&self, element: &ElementRef, selector: &str) -> AppResult<Option<ElementRef>>;

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool>;

    /// 可见文本（innerText）
    async fn inner_text(&self, element: &ElementRef) -> AppResult<String>;

    async fn attribute(&self, element: &ElementRef, name: &str) -> AppResult<Option<String>>;

    /// 输入框当前值
    async fn input_value(&self, element: &ElementRef) -> AppResult<String>;

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool>;

    /// 清空并写入文本
    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()>;

    /// 模拟鼠标点击（会被遮挡层拦截）
    async fn click(&self, element: &ElementRef) -> AppResult<()>;

    /// 直接调用元素的 click()，绕开遮挡层
    async fn activate(&self, element: &ElementRef) -> AppResult<()>;

    /// 勾选复选框
    async fn check(&self, element: &ElementRef) -> AppResult<()>;

    /// 下拉框所有选项的可见文本
    async fn option_texts(&self, select: &ElementRef) -> AppResult<Vec<String>>;

    /// 下拉框当前选中项下标
    async fn selected_index(&self, select: &ElementRef) -> AppResult<Option<usize>>;

    /// 按可见文本选择，返回是否选中
    async fn select_option_by_label(&self, select: &ElementRef, label: &str) -> AppResult<bool>;

    /// 按下标选择，返回是否选中
    async fn select_option_by_index(&self, select: &ElementRef, index: usize) -> AppResult<bool>;

    /// 给文件输入框设置本地文件
    async fn set_input_files(&self, element: &ElementRef, path: &str) -> AppResult<()>;

    async fn scroll_into_view(&self, element: &ElementRef) -> AppResult<()>;

    /// 隐藏匹配选择器的元素（display: none），返回隐藏的数量
    async fn hide_elements(&self, selectors: &[&str]) -> AppResult<usize>;
}

/// 第一个匹配元素是否存在
pub async fn is_present(
    page: &dyn PageSurface,
    scope: Option<&ElementRef>,
    selector: &str,
) -> AppResult<bool> {
    Ok(!page.query(scope, selector).await?.is_empty())
}

/// 等待选择器出现，超时返回 `Ok(false)`
///
/// 至少检查一次，因此 `timeout` 为零时等价于一次即时检查。
pub async fn wait_for_selector(
    page: &dyn PageSurface,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> AppResult<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        if is_present(page, None, selector).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(poll_interval.max(Duration::from_millis(10))).await;
    }
}
