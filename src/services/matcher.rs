//! 多策略元素匹配 - 业务能力层
//!
//! 入口按钮、导航按钮都可能以不同的 class / aria-label / 文本出现。
//! 每种找法是一个 [`ElementMatcher`]，[`MatcherChain`] 按顺序尝试，
//! 第一个"存在且可见"的结果胜出。新增找法只需往链里加一项。

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::{ElementRef, PageSurface};
use crate::services::selectors;
use crate::services::vocabulary::{FORWARD_ACTION, REVIEW_ACTION, SUBMIT_ACTION};

/// 一种元素查找策略
#[async_trait]
pub trait ElementMatcher: Send + Sync {
    /// 用于日志的描述
    fn describe(&self) -> String;

    /// 返回第一个可见的匹配元素
    async fn find(
        &self,
        page: &dyn PageSurface,
        scope: Option<&ElementRef>,
    ) -> AppResult<Option<ElementRef>>;
}

/// 按 CSS 选择器查找
pub struct CssMatcher {
    selector: String,
}

impl CssMatcher {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl ElementMatcher for CssMatcher {
    fn describe(&self) -> String {
        format!("css `{}`", self.selector)
    }

    async fn find(
        &self,
        page: &dyn PageSurface,
        scope: Option<&ElementRef>,
    ) -> AppResult<Option<ElementRef>> {
        for element in page.query(scope, &self.selector).await? {
            if page.is_visible(&element).await.unwrap_or(false) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

/// 按选择器 + 可见文本正则查找
pub struct TextMatcher {
    selector: String,
    pattern: Regex,
}

impl TextMatcher {
    pub fn new(selector: impl Into<String>, pattern: Regex) -> Self {
        Self {
            selector: selector.into(),
            pattern,
        }
    }

    /// 文本包含 `needle`（不区分大小写）
    pub fn containing(selector: impl Into<String>, needle: &str) -> Self {
        let pattern = Regex::new(&format!("(?i){}", regex::escape(needle)))
            .expect("escaped literal is a valid regex");
        Self::new(selector, pattern)
    }
}

#[async_trait]
impl ElementMatcher for TextMatcher {
    fn describe(&self) -> String {
        format!("text /{}/ in `{}`", self.pattern, self.selector)
    }

    async fn find(
        &self,
        page: &dyn PageSurface,
        scope: Option<&ElementRef>,
    ) -> AppResult<Option<ElementRef>> {
        for element in page.query(scope, &self.selector).await? {
            let text = page.inner_text(&element).await.unwrap_or_default();
            if !self.pattern.is_match(&text) {
                continue;
            }
            if page.is_visible(&element).await.unwrap_or(false) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

/// 按优先级排列的一组策略
pub struct MatcherChain {
    name: &'static str,
    matchers: Vec<Box<dyn ElementMatcher>>,
}

impl MatcherChain {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            matchers: Vec::new(),
        }
    }

    pub fn with(mut self, matcher: impl ElementMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// 依次尝试，第一个可见匹配胜出
    pub async fn first_visible(
        &self,
        page: &dyn PageSurface,
        scope: Option<&ElementRef>,
    ) -> AppResult<Option<ElementRef>> {
        for matcher in &self.matchers {
            match matcher.find(page, scope).await {
                Ok(Some(element)) => {
                    debug!("[{}] 命中策略: {}", self.name, matcher.describe());
                    return Ok(Some(element));
                }
                Ok(None) => {}
                Err(e) if e.is_element_missing() => {
                    debug!("[{}] 策略 {} 的作用域已失效", self.name, matcher.describe());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

/// 向导里的导航动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    Submit,
    Review,
    Next,
}

impl NavAction {
    /// 按按钮文本归类，用于兜底主按钮
    pub fn classify(text: &str) -> Option<Self> {
        if SUBMIT_ACTION.is_match(text) {
            Some(NavAction::Submit)
        } else if REVIEW_ACTION.is_match(text) {
            Some(NavAction::Review)
        } else if FORWARD_ACTION.is_match(text) {
            Some(NavAction::Next)
        } else {
            None
        }
    }
}

/// 找到的导航按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub action: NavAction,
    pub element: ElementRef,
    /// 是否来自兜底主按钮
    pub via_fallback: bool,
}

/// 页面上所有需要的策略链
pub struct Matchers {
    pub entry_point: MatcherChain,
    pub submit: MatcherChain,
    pub review: MatcherChain,
    pub next: MatcherChain,
    pub forward_fallback: MatcherChain,
    pub acknowledgement: MatcherChain,
}

impl Default for Matchers {
    fn default() -> Self {
        Self::new()
    }
}

impl Matchers {
    pub fn new() -> Self {
        let clickable = "button, a, [role=\"button\"]";
        Self {
            entry_point: MatcherChain::new("entry")
                .with(CssMatcher::new("button.jobs-apply-button"))
                .with(CssMatcher::new(".jobs-apply-button--top-card button"))
                .with(CssMatcher::new(r#"button[aria-label*="Easy Apply"]"#))
                .with(CssMatcher::new(r#"button[aria-label*="Candidature simplifiée"]"#))
                .with(TextMatcher::containing(clickable, "Easy Apply"))
                .with(TextMatcher::containing(clickable, "Candidature simplifiée"))
                .with(TextMatcher::containing(clickable, "Postuler maintenant")),
            submit: MatcherChain::new("submit")
                .with(CssMatcher::new(
                    r#"button[aria-label="Submit application"], button[aria-label="Envoyer la candidature"]"#,
                ))
                .with(TextMatcher::new(
                    "button",
                    Regex::new(r"(?i)submit application|envoyer la candidature")
                        .expect("valid regex"),
                )),
            review: MatcherChain::new("review")
                .with(CssMatcher::new(
                    r#"button[aria-label="Review your application"], button[aria-label="Vérifier votre candidature"]"#,
                ))
                .with(TextMatcher::new("button", REVIEW_ACTION.clone())),
            next: MatcherChain::new("next")
                .with(CssMatcher::new(
                    r#"button[aria-label="Continue to next step"], button[aria-label="Aller à l’étape suivante"]"#,
                ))
                .with(TextMatcher::new(
                    "button",
                    Regex::new(r"(?i)next|suivant").expect("valid regex"),
                )),
            forward_fallback: MatcherChain::new("fallback")
                .with(TextMatcher::new(selectors::PRIMARY_FOOTER_BUTTON, FORWARD_ACTION.clone())),
            acknowledgement: MatcherChain::new("done")
                .with(TextMatcher::new(
                    "button",
                    Regex::new(r"(?i)\b(done|terminé)\b").expect("valid regex"),
                )),
        }
    }

    /// 按优先级查找导航按钮：Submit > Review > Next > 兜底主按钮
    pub async fn locate_navigation(
        &self,
        page: &dyn PageSurface,
        modal: &ElementRef,
    ) -> AppResult<Option<NavTarget>> {
        let explicit = [
            (NavAction::Submit, &self.submit),
            (NavAction::Review, &self.review),
            (NavAction::Next, &self.next),
        ];
        for (action, chain) in explicit {
            if let Some(element) = chain.first_visible(page, Some(modal)).await? {
                return Ok(Some(NavTarget {
                    action,
                    element,
                    via_fallback: false,
                }));
            }
        }

        let Some(element) = self.forward_fallback.first_visible(page, Some(modal)).await? else {
            return Ok(None);
        };
        let text = page.inner_text(&element).await.unwrap_or_default();
        Ok(NavAction::classify(&text).map(|action| {
            debug!("兜底主按钮: \"{}\" -> {:?}", text.trim(), action);
            NavTarget {
                action,
                element,
                via_fallback: true,
            }
        }))
    }
}
